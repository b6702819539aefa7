use thiserror::Error;

/// Errors returned by the session manager
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is already running")]
    AlreadyRunning,

    #[error("session is not running")]
    NotRunning,

    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}
