//! Logging middleware.
//!
//! Re-decorates the current context and passes it downstream, so every
//! middleware after this stage gets a logger bound to the invocation's
//! function name, request ID, version and the invocation's existing ID.
//! Upstream middleware keep the context they already had.

use crate::middleware::{Middleware, Next};
use lamina_core::{BoxFuture, Context, ContextDecorator, LogLevel, Outcome};
use serde_json::Value;

/// Middleware that replaces the context with a freshly decorated one.
///
/// # Example
///
/// ```
/// use lamina_core::LogLevel;
/// use lamina_middleware::stages::LoggingMiddleware;
/// use lamina_middleware::Chain;
///
/// let chain = Chain::builder()
///     .with(LoggingMiddleware::new(LogLevel::Debug))
///     .build();
/// assert_eq!(chain.stage_names(), vec!["logging"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware {
    decorator: ContextDecorator,
}

impl LoggingMiddleware {
    /// Creates the stage with a fixed log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self::with_decorator(ContextDecorator::new(level))
    }

    /// Creates the stage from an existing decorator.
    #[must_use]
    pub const fn with_decorator(decorator: ContextDecorator) -> Self {
        Self { decorator }
    }

    /// Returns the level used for downstream loggers.
    pub const fn level(&self) -> LogLevel {
        self.decorator.level()
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn process<'a>(&'a self, _event: Value, context: Context, next: Next) -> BoxFuture<'a, Outcome> {
        next.with_context(self.decorator.redecorate(&context))
    }
}
