//! Error sanitizing middleware.
//!
//! Awaits the rest of the chain and, if it failed, empties the error's
//! stack before re-raising it. Errors without a stack pass through as-is.

use crate::middleware::{Middleware, Next};
use lamina_core::{BoxFuture, Context, Outcome};
use serde_json::Value;

/// Middleware that strips stacks from downstream errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizeErrorsMiddleware;

impl SanitizeErrorsMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for SanitizeErrorsMiddleware {
    fn name(&self) -> &'static str {
        "sanitize_errors"
    }

    fn process<'a>(&'a self, _event: Value, _context: Context, next: Next) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            next.run().await.map_err(|mut error| {
                error.clear_stack();
                error
            })
        })
    }
}
