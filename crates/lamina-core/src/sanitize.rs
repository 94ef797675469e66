//! Stack stripping for errors leaving the system.

use crate::error::HandlerError;

/// Returns `error`, with its stack emptied unless `error_stack` is set.
///
/// An error that never had a stack is returned as-is; no empty stack is
/// created for it. Name, message and details are never touched.
///
/// # Example
///
/// ```
/// use lamina_core::{sanitize::sanitize, HandlerError};
///
/// let err = sanitize(HandlerError::new("Winter is coming!"), false);
/// assert_eq!(err.stack.as_deref(), Some(""));
/// assert_eq!(err.message, "Winter is coming!");
///
/// let plain = sanitize(HandlerError::plain("just a value"), false);
/// assert!(plain.stack.is_none());
/// ```
#[must_use]
pub fn sanitize(mut error: HandlerError, error_stack: bool) -> HandlerError {
    if !error_stack {
        error.clear_stack();
    }
    error
}
