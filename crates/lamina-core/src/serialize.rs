//! Log-safe serialization of errors and contexts.
//!
//! Values attached to log records go through these functions so that a
//! logged context never drags its logger along, and so that errors always
//! appear in the same `{message, name, stack, ...details}` shape.

use crate::context::Context;
use crate::error::HandlerError;
use serde_json::{Map, Value};

/// Normalizes an error for logging.
///
/// Errors with a stack are rendered as their custom detail fields overlaid
/// with `message`, `name`, and `stack`. Errors without a stack behave like
/// plain values: they are rendered as `message` plus details, unchanged.
///
/// # Example
///
/// ```
/// use lamina_core::{serialize, HandlerError};
///
/// let err = HandlerError::new("Winter is coming!").with_detail("temperature", -1);
/// let value = serialize::error_value(&err);
///
/// assert_eq!(value["message"], "Winter is coming!");
/// assert_eq!(value["name"], "Error");
/// assert_eq!(value["temperature"], -1);
/// assert!(value["stack"].is_string());
/// ```
#[must_use]
pub fn error_value(error: &HandlerError) -> Value {
    let mut out: Map<String, Value> = error.details.clone();
    out.insert("message".to_string(), Value::String(error.message.clone()));

    if let Some(stack) = &error.stack {
        out.insert("name".to_string(), Value::String(error.name.clone()));
        out.insert("stack".to_string(), Value::String(stack.clone()));
    }

    Value::Object(out)
}

/// Serializes a context for logging, omitting its logger.
#[must_use]
pub fn context_value(context: &Context) -> Value {
    Value::Object(context.fields().clone())
}
