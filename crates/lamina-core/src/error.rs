//! Error values that flow through an invocation.
//!
//! [`HandlerError`] is the single error type delivered to the completion
//! callback. It mirrors the shape platforms expect from a failed function:
//! a `name`, a human-readable `message`, an optional `stack`, and any number
//! of custom detail fields.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::Location;
use thiserror::Error;

/// Name given to errors created without an explicit name.
pub const DEFAULT_ERROR_NAME: &str = "Error";

/// Name given to errors converted from a caught panic.
pub const PANIC_ERROR_NAME: &str = "Panic";

/// Name given to the error raised when a `next` continuation is re-entered.
pub const REENTRANT_NEXT_ERROR_NAME: &str = "ReentrantNext";

/// An error produced by a handler, middleware, or hook.
///
/// Errors created through [`HandlerError::new`] or [`HandlerError::named`]
/// carry a stack line pointing at the construction site. Errors created with
/// [`HandlerError::plain`] carry no stack at all, matching a thrown non-error
/// value; sanitization leaves such errors untouched.
///
/// # Example
///
/// ```
/// use lamina_core::HandlerError;
///
/// let err = HandlerError::new("Winter is coming!").with_detail("temperature", -1);
/// assert_eq!(err.message, "Winter is coming!");
/// assert!(err.has_stack());
/// assert_eq!(err.details["temperature"], -1);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Deserialize)]
#[error("{name}: {message}")]
pub struct HandlerError {
    /// Error class name (e.g. `"Error"`, `"ValidationError"`).
    pub name: String,

    /// Human-readable error message.
    pub message: String,

    /// Diagnostic stack trace, if any.
    #[serde(default)]
    pub stack: Option<String>,

    /// Custom fields attached to the error.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl HandlerError {
    /// Creates an error named `Error` with a stack pointing at the caller.
    #[must_use]
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::named(DEFAULT_ERROR_NAME, message)
    }

    /// Creates an error with a specific name and a stack pointing at the caller.
    #[must_use]
    #[track_caller]
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack = format!("{name}: {message}\n    at {}", Location::caller());
        Self {
            name,
            message,
            stack: Some(stack),
            details: Map::new(),
        }
    }

    /// Creates an error without any stack information.
    #[must_use]
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_ERROR_NAME.to_string(),
            message: message.into(),
            stack: None,
            details: Map::new(),
        }
    }

    /// Creates an error from any [`std::error::Error`], keeping its display text.
    #[must_use]
    #[track_caller]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(error.to_string())
    }

    /// Converts a caught panic payload into an error.
    #[must_use]
    #[track_caller]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        Self::named(PANIC_ERROR_NAME, message)
    }

    /// The error raised when a `next` continuation is invoked a second time.
    #[must_use]
    #[track_caller]
    pub fn reentrant_next() -> Self {
        Self::named(REENTRANT_NEXT_ERROR_NAME, "next() called more than once")
    }

    /// Returns the error with an additional custom field.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the error with the given stack.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Returns `true` if the error carries a non-empty stack.
    #[must_use]
    pub fn has_stack(&self) -> bool {
        self.stack.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Empties the stack in place. An absent stack stays absent.
    pub fn clear_stack(&mut self) {
        if let Some(stack) = self.stack.as_mut() {
            stack.clear();
        }
    }

    /// Returns `true` if this is the re-entrant `next` error.
    #[must_use]
    pub fn is_reentrant_next(&self) -> bool {
        self.name == REENTRANT_NEXT_ERROR_NAME
    }
}

/// Keys owned by the error itself; details with these names are not
/// serialized.
const RESERVED_KEYS: [&str; 3] = ["name", "message", "stack"];

impl Serialize for HandlerError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let details = self
            .details
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()));

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("message", &self.message)?;
        if let Some(stack) = &self.stack {
            map.serialize_entry("stack", stack)?;
        }
        for (key, value) in details {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl From<String> for HandlerError {
    #[track_caller]
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    #[track_caller]
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        Self::named("SerializationError", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error_has_stack() {
        let err = HandlerError::new("boom");
        assert_eq!(err.name, "Error");
        assert_eq!(err.message, "boom");
        assert!(err.has_stack());
        assert!(err.stack.as_deref().unwrap().starts_with("Error: boom"));
        assert!(err.stack.as_deref().unwrap().contains("error.rs"));
    }

    #[test]
    fn test_plain_error_has_no_stack() {
        let err = HandlerError::plain("just a value");
        assert!(err.stack.is_none());
        assert!(!err.has_stack());
    }

    #[test]
    fn test_clear_stack_keeps_absent_stack_absent() {
        let mut with_stack = HandlerError::new("x");
        with_stack.clear_stack();
        assert_eq!(with_stack.stack.as_deref(), Some(""));

        let mut without_stack = HandlerError::plain("x");
        without_stack.clear_stack();
        assert!(without_stack.stack.is_none());
    }

    #[test]
    fn test_display() {
        let err = HandlerError::named("ValidationError", "bad input");
        assert_eq!(err.to_string(), "ValidationError: bad input");
    }

    #[test]
    fn test_from_panic_payloads() {
        let static_str: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(HandlerError::from_panic(static_str.as_ref()).message, "static message");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let err = HandlerError::from_panic(owned.as_ref());
        assert_eq!(err.name, PANIC_ERROR_NAME);
        assert_eq!(err.message, "owned message");

        let other: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(HandlerError::from_panic(other.as_ref()).message, "handler panicked");
    }

    #[test]
    fn test_reentrant_next() {
        let err = HandlerError::reentrant_next();
        assert!(err.is_reentrant_next());
        assert_eq!(err.message, "next() called more than once");
    }

    #[test]
    fn test_serialization_flattens_details() {
        let err = HandlerError::plain("cold").with_detail("temperature", -1);
        let json = serde_json::to_value(&err).expect("serialization should work");
        assert_eq!(json["message"], "cold");
        assert_eq!(json["temperature"], -1);
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn test_details_cannot_shadow_own_fields() {
        let err = HandlerError::new("real message")
            .with_detail("message", "fake")
            .with_detail("stack", "fake")
            .with_detail("code", 7);

        let text = serde_json::to_string(&err).unwrap();
        assert_eq!(text.matches("\"message\"").count(), 1);
        assert_eq!(text.matches("\"stack\"").count(), 1);

        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["message"], "real message");
        assert!(json["stack"].as_str().unwrap().starts_with("Error: real message"));
        assert_eq!(json["code"], 7);
    }
}
