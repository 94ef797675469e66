//! # Lamina
//!
//! **Composable handler wrapping for function-as-a-service runtimes**
//!
//! Lamina turns a plain handler into an invocable function with:
//!
//! - 🧅 **Onion middleware** – Ordered chain with `next`, early return, error catching
//! - 🪝 **Lifecycle hooks** – `on_before`, `on_after`, `on_error` with error recovery
//! - 📝 **Structured context logging** – Every invocation gets a logger bound to its request
//! - 🧹 **Stack sanitization** – Optionally strip stacks before errors leave the process
//! - 🔀 **Two handler styles** – Returning or callback, chosen explicitly
//!
//! ## Quick Start
//!
//! ```
//! use lamina::prelude::*;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let lambda = lamina::wrap(Handler::returning(|event, ctx| async move {
//!     ctx.log().info("handling event");
//!     Ok(Some(json!({ "echo": event })))
//! }))
//! .log_level(LogLevel::Warn)
//! .build();
//!
//! let raw = LambdaContext::new("echo", "00112233445566778899", "$LATEST");
//! let outcome = lambda.invoke(json!("hi"), raw).await;
//! assert_eq!(outcome, Ok(Some(json!({ "echo": "hi" }))));
//! # });
//! ```
//!
//! ## Middleware
//!
//! ```
//! use lamina::prelude::*;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let lambda = lamina::chain()
//!     .with(SanitizeErrorsMiddleware::new())
//!     .with(from_fn(|_event, _ctx, next: Next| async move { next.run().await }))
//!     .with(from_fn(|_event, _ctx, _next| async move { Ok(Some(json!("done"))) }))
//!     .log_level(LogLevel::Info)
//!     .build();
//!
//! let outcome = lambda.invoke(json!({}), LambdaContext::default()).await;
//! assert_eq!(outcome, Ok(Some(json!("done"))));
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! invoke(event, raw context)
//!   → decorate context
//!   → on_before → handler | chain → on_after
//!   → on_error (on any failure) → sanitize
//!   → outcome (returned and/or passed to the callback)
//! ```

#![doc(html_root_url = "https://docs.rs/lamina/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod wrapper;

pub use builder::LambdaBuilder;
pub use wrapper::LambdaFn;

// Re-export core types
pub use lamina_core as core;

// Re-export middleware types
pub use lamina_middleware as middleware;

// Re-export configuration types
pub use lamina_config as config;

// Re-export logging setup
pub use lamina_telemetry as telemetry;

use lamina_core::Handler;

/// Starts a composition around a single handler.
///
/// Middleware added with [`LambdaBuilder::with`] run before the handler.
pub fn wrap(handler: Handler) -> LambdaBuilder {
    LambdaBuilder::new().handler(handler)
}

/// Starts a middleware-only composition.
///
/// The chain's result comes from whichever middleware supplies one.
pub fn chain() -> LambdaBuilder {
    LambdaBuilder::new()
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use lamina::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{chain, wrap, LambdaBuilder, LambdaFn};

    pub use lamina_core::{
        Context, ContextDecorator, ContextLogger, Done, Handler, HandlerError, HookOutcome,
        LambdaContext, LogLevel, Outcome,
    };

    // Re-export middleware types
    pub use lamina_middleware::stages::{LoggingMiddleware, SanitizeErrorsMiddleware};
    pub use lamina_middleware::{from_fn, FnMiddleware, Middleware, Next, Resume};

    // Re-export configuration types
    pub use lamina_config::{ConfigError, ConfigLoader, LaminaConfig};
}
