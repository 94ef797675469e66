//! Core middleware trait and continuation.
//!
//! This module defines the [`Middleware`] trait every chain entry
//! implements, and [`Next`], the continuation handed to each middleware.
//!
//! # Example
//!
//! ```
//! use lamina_core::{BoxFuture, Context, Outcome};
//! use lamina_middleware::{Middleware, Next};
//! use serde_json::Value;
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         _event: Value,
//!         context: Context,
//!         next: Next,
//!     ) -> BoxFuture<'a, Outcome> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let outcome = next.run().await;
//!             context.log().debug(&format!("took {:?}", start.elapsed()));
//!             outcome
//!         })
//!     }
//! }
//! ```

use crate::dispatcher::Invocation;
use lamina_core::handler::{self, Handler};
use lamina_core::{BoxFuture, Context, HandlerError, Outcome};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// A unit in the middleware chain.
///
/// # Invariants
///
/// - A middleware SHOULD call its `next` at most once. Calling it again is
///   rejected with a `ReentrantNext` error when the chain is strict.
/// - Returning `Ok(Some(v))` makes `v` the invocation's result, whether or
///   not `next` was called.
/// - Returning `Ok(None)` leaves the result untouched.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Processes one invocation.
    ///
    /// # Arguments
    ///
    /// * `event` - The current event
    /// * `context` - The current decorated context
    /// * `next` - Continuation to the rest of the chain
    fn process<'a>(&'a self, event: Value, context: Context, next: Next) -> BoxFuture<'a, Outcome>;
}

/// Arguments for resuming the chain.
///
/// Mirrors the three-argument `next(error, context, event)` continuation:
/// an error short-circuits, a context or event replaces the current one for
/// everything downstream.
#[derive(Debug, Clone, Default)]
pub struct Resume {
    /// Reject instead of continuing.
    pub error: Option<HandlerError>,
    /// Replacement context for downstream middleware.
    pub context: Option<Context>,
    /// Replacement event for downstream middleware.
    pub event: Option<Value>,
}

impl Resume {
    /// Plain continuation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error.
    pub fn error(mut self, error: impl Into<HandlerError>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets the replacement context.
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the replacement event.
    pub fn event(mut self, event: Value) -> Self {
        self.event = Some(event);
        self
    }
}

/// Continuation to the rest of the chain.
///
/// `Next` is bound to the position of the middleware that received it.
/// It can be cloned and moved into spawned tasks; every method returns an
/// owned future.
///
/// The returned future resolves to the invocation's current result once the
/// downstream chain completes, or to the downstream error.
#[derive(Clone)]
pub struct Next {
    invocation: Arc<Invocation>,
    position: usize,
}

impl Next {
    pub(crate) fn new(invocation: Arc<Invocation>, position: usize) -> Self {
        Self {
            invocation,
            position,
        }
    }

    /// Returns the position of the middleware this continuation belongs to.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Continues with the current event and context.
    pub fn run(&self) -> BoxFuture<'static, Outcome> {
        self.resume(Resume::new())
    }

    /// Rejects without running anything downstream.
    pub fn fail(&self, error: impl Into<HandlerError>) -> BoxFuture<'static, Outcome> {
        self.resume(Resume::new().error(error))
    }

    /// Continues with `context` replacing the current context downstream.
    pub fn with_context(&self, context: Context) -> BoxFuture<'static, Outcome> {
        self.resume(Resume::new().context(context))
    }

    /// Continues with `event` replacing the current event downstream.
    pub fn with_event(&self, event: Value) -> BoxFuture<'static, Outcome> {
        self.resume(Resume::new().event(event))
    }

    /// Resumes the chain.
    ///
    /// An error in `resume` rejects immediately: no replacement is applied
    /// and nothing further is dispatched. Otherwise replacements are applied
    /// before the next position is dispatched.
    pub fn resume(&self, resume: Resume) -> BoxFuture<'static, Outcome> {
        let Resume {
            error,
            context,
            event,
        } = resume;

        if let Some(error) = error {
            return Box::pin(futures_util::future::ready(Err(error)));
        }

        self.invocation.replace(context, event);
        Invocation::dispatch(Arc::clone(&self.invocation), self.position + 1)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// A middleware created from an async function.
///
/// # Example
///
/// ```
/// use lamina_middleware::FnMiddleware;
///
/// let passthrough = FnMiddleware::new("passthrough", |_event, _ctx, next| async move {
///     next.run().await
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a named function middleware.
    pub fn new<Fut>(name: &'static str, func: F) -> Self
    where
        F: Fn(Value, Context, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self { name, func }
    }
}

/// Creates an unnamed function middleware.
pub fn from_fn<F, Fut>(func: F) -> FnMiddleware<F>
where
    F: Fn(Value, Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    FnMiddleware::new("fn", func)
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Value, Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(&'a self, event: Value, context: Context, next: Next) -> BoxFuture<'a, Outcome> {
        Box::pin((self.func)(event, context, next))
    }
}

/// Runs a [`Handler`] as the terminal entry of a chain.
///
/// The handler never sees `next`; its outcome becomes the chain's result
/// through the usual result rules.
#[derive(Debug, Clone)]
pub struct HandlerMiddleware {
    handler: Handler,
}

impl HandlerMiddleware {
    /// Wraps a handler.
    pub const fn new(handler: Handler) -> Self {
        Self { handler }
    }
}

impl Middleware for HandlerMiddleware {
    fn name(&self) -> &'static str {
        "handler"
    }

    fn process<'a>(&'a self, event: Value, context: Context, _next: Next) -> BoxFuture<'a, Outcome> {
        Box::pin(handler::invoke(&self.handler, event, context))
    }
}
