//! Composition builder.
//!
//! [`LambdaBuilder`] collects a handler, middleware, hooks and options, then
//! [`build`](LambdaBuilder::build)s an immutable [`LambdaFn`].
//!
//! Without middleware the handler runs directly through the invocation
//! adapter. With middleware, the handler (if any) becomes the last entry of
//! the chain.

use crate::wrapper::{Composition, LambdaFn};
use lamina_config::{ConfigError, LaminaConfig};
use lamina_core::{Context, ContextDecorator, Handler, HandlerError, HookOutcome, Hooks, LogLevel};
use lamina_middleware::{Chain, ChainBuilder, HandlerMiddleware, Middleware};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Builder for a [`LambdaFn`].
///
/// # Example
///
/// ```
/// use lamina::prelude::*;
/// use serde_json::json;
///
/// let lambda = lamina::wrap(Handler::from_fn(|_, _| Ok(Some(json!(42)))))
///     .on_after(|result, _event, _ctx| Ok(result.as_ref().map(|v| json!({ "answer": v }))))
///     .error_stack(false)
///     .log_level(LogLevel::Warn)
///     .build();
///
/// assert!(!lambda.error_stack());
/// ```
#[must_use]
pub struct LambdaBuilder {
    handler: Option<Handler>,
    chain: ChainBuilder,
    hooks: Hooks,
    error_stack: bool,
    decorator: Option<ContextDecorator>,
}

impl LambdaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            handler: None,
            chain: Chain::builder(),
            hooks: Hooks::default(),
            error_stack: true,
            decorator: None,
        }
    }

    /// Sets the terminal handler.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Appends a middleware to the chain.
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.chain = self.chain.with(middleware);
        self
    }

    /// Registers the `on_before` hook.
    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &Context) -> HookOutcome<Value> + Send + Sync + 'static,
    {
        self.hooks.on_before = Some(Arc::new(hook));
        self
    }

    /// Registers the `on_after` hook.
    pub fn on_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Option<Value>, &Value, &Context) -> HookOutcome<Value> + Send + Sync + 'static,
    {
        self.hooks.on_after = Some(Arc::new(hook));
        self
    }

    /// Registers the `on_error` hook.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HandlerError, &Value, &Context) -> HookOutcome<Value> + Send + Sync + 'static,
    {
        self.hooks.on_error = Some(Arc::new(hook));
        self
    }

    /// Keeps (`true`, the default) or empties the stack of delivered errors.
    pub fn error_stack(mut self, error_stack: bool) -> Self {
        self.error_stack = error_stack;
        self
    }

    /// Rejects (`true`, the default) or allows a second call of the same
    /// `next` continuation.
    pub fn strict_next(mut self, strict: bool) -> Self {
        self.chain = self.chain.strict(strict);
        self
    }

    /// Fixes the context logger level, instead of reading `LOG_LEVEL`.
    pub fn log_level(self, level: LogLevel) -> Self {
        self.decorator(ContextDecorator::new(level))
    }

    /// Uses a specific context decorator.
    pub fn decorator(mut self, decorator: ContextDecorator) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Applies a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the configured log level is
    /// not valid.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_config(self, config: &LaminaConfig) -> Result<Self, ConfigError> {
        let level = config.log_level()?;
        Ok(self
            .error_stack(config.errors.error_stack)
            .strict_next(config.dispatch.strict_next)
            .log_level(level))
    }

    /// Builds the composed handler.
    ///
    /// If no level was given, `LOG_LEVEL` is read here, once. An invalid
    /// value falls back to `info`.
    #[must_use]
    pub fn build(self) -> LambdaFn {
        let decorator = self.decorator.unwrap_or_else(|| {
            ContextDecorator::from_env().unwrap_or_else(|error| {
                warn!(error = %error, "ignoring invalid LOG_LEVEL, using info");
                ContextDecorator::default()
            })
        });

        let composition = match self.handler {
            Some(handler) if self.chain.is_empty() => Composition::Handler(handler),
            Some(handler) => Composition::Chain(self.chain.with(HandlerMiddleware::new(handler)).build()),
            None => Composition::Chain(self.chain.build()),
        };

        LambdaFn::new(composition, self.hooks, self.error_stack, decorator)
    }
}

impl Default for LambdaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LambdaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaBuilder")
            .field("handler", &self.handler)
            .field("middleware", &self.chain.len())
            .field("hooks", &self.hooks)
            .field("error_stack", &self.error_stack)
            .field("decorator", &self.decorator)
            .finish()
    }
}
