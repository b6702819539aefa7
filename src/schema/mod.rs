//! Schema module for the workflow document shape and its validation

mod validator;
mod workflow;

pub use validator::{validate, RawSchemaError, SchemaKeyword};
pub use workflow::{
    is_scan_action, is_trigger_event, Backend, BACKENDS, SCAN_ACTION, SCAN_ACTION_EXAMPLE,
    TRIGGER_EVENTS, VENDOR_NAMESPACE,
};
