//! Built-in middleware stages.
//!
//! - [`logging`] - Decorates the context with a structured logger
//! - [`sanitize_errors`] - Empties the stack of downstream errors
//!
//! Both are ordinary [`Middleware`](crate::Middleware) and are added to a
//! chain like any other.

pub mod logging;
pub mod sanitize_errors;

pub use logging::LoggingMiddleware;
pub use sanitize_errors::SanitizeErrorsMiddleware;
