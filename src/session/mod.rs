//! Session expiry tracking
//!
//! A [`SessionManager`] owns one session record on a background task and
//! reports warnings, extensions and expiry over an event channel.

mod config;
mod error;
mod manager;

pub use config::SessionConfig;
pub use error::SessionError;
pub use manager::{ExpiryReason, SessionEvent, SessionManager, SessionSnapshot};
