//! Middleware chain and per-invocation dispatcher.
//!
//! A [`Chain`] is built once and shared by every invocation. Each call to
//! [`Chain::dispatch`] creates a fresh invocation state (event, context,
//! current result, highest dispatched position) and dispatches position 0.
//!
//! ## Dispatch
//!
//! For each position:
//!
//! 1. If the chain is strict and the position was already reached, reject
//!    with a `ReentrantNext` error.
//! 2. Past the last middleware, resolve with the current result.
//! 3. Otherwise run the middleware with the current event and context and a
//!    [`Next`] bound to this position. A panic becomes a `Panic` error.
//! 4. A returned value becomes the current result; the outcome propagates
//!    upstream.

use crate::middleware::{Middleware, Next};
use lamina_core::handler::catch_panic;
use lamina_core::{BoxFuture, Context, HandlerError, Outcome};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// A type-erased middleware that can be stored in the chain.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered, immutable middleware chain.
///
/// Cloning a `Chain` is cheap; clones share the middleware list.
#[derive(Clone)]
pub struct Chain {
    middleware: Arc<[BoxedMiddleware]>,
    strict: bool,
}

impl Chain {
    /// Creates a new chain builder.
    #[must_use]
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Runs one invocation through the chain.
    ///
    /// Resolves with the final result (`Ok(None)` if nothing produced one)
    /// or the first uncaught error.
    pub async fn dispatch(&self, event: Value, context: Context) -> Outcome {
        let invocation = Arc::new(Invocation::new(
            Arc::clone(&self.middleware),
            self.strict,
            event,
            context,
        ));
        Invocation::dispatch(invocation, 0).await
    }

    /// Returns `true` if re-entering a `next` continuation is rejected.
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Returns the names of all middleware in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware.
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if the chain has no middleware.
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.stage_names())
            .field("strict", &self.strict)
            .finish()
    }
}

/// Builder for constructing a [`Chain`].
///
/// Middleware run downstream in the order they are added.
pub struct ChainBuilder {
    middleware: Vec<BoxedMiddleware>,
    strict: bool,
}

impl ChainBuilder {
    /// Creates an empty, strict builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
            strict: true,
        }
    }

    /// Appends a middleware.
    #[must_use]
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an already type-erased middleware.
    #[must_use]
    pub fn with_boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Sets whether re-entering a `next` continuation is rejected.
    ///
    /// Strict by default.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the number of middleware added so far.
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if no middleware has been added.
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Builds the chain. The middleware list is fixed from here on.
    #[must_use]
    pub fn build(self) -> Chain {
        Chain {
            middleware: self.middleware.into(),
            strict: self.strict,
        }
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state of one invocation.
struct InvocationState {
    event: Value,
    context: Context,
    result: Option<Value>,
    index: Option<usize>,
}

/// One run through a chain.
pub(crate) struct Invocation {
    middleware: Arc<[BoxedMiddleware]>,
    strict: bool,
    state: Mutex<InvocationState>,
}

impl Invocation {
    fn new(middleware: Arc<[BoxedMiddleware]>, strict: bool, event: Value, context: Context) -> Self {
        Self {
            middleware,
            strict,
            state: Mutex::new(InvocationState {
                event,
                context,
                result: None,
                index: None,
            }),
        }
    }

    /// Replaces the context and/or event for everything dispatched next.
    pub(crate) fn replace(&self, context: Option<Context>, event: Option<Value>) {
        if context.is_none() && event.is_none() {
            return;
        }
        let mut state = self.state.lock();
        if let Some(context) = context {
            state.context = context;
        }
        if let Some(event) = event {
            state.event = event;
        }
    }

    pub(crate) fn dispatch(self: Arc<Self>, position: usize) -> BoxFuture<'static, Outcome> {
        Box::pin(async move {
            let (event, context) = {
                let mut state = self.state.lock();
                if self.strict && state.index.is_some_and(|index| position <= index) {
                    warn!(position, "next() called more than once");
                    return Err(HandlerError::reentrant_next());
                }
                state.index = Some(position);
                (state.event.clone(), state.context.clone())
            };

            let Some(middleware) = self.middleware.get(position).cloned() else {
                debug!(position, "reached end of chain");
                return Ok(self.state.lock().result.clone());
            };

            debug!(middleware = middleware.name(), position, "dispatching middleware");
            let next = Next::new(Arc::clone(&self), position);
            let outcome = catch_panic(async move { middleware.process(event, context, next).await }).await;

            match outcome {
                Ok(value) => {
                    let mut state = self.state.lock();
                    if let Some(value) = value {
                        state.result = Some(value);
                    }
                    Ok(state.result.clone())
                }
                Err(error) => {
                    debug!(position, error = %error, "middleware rejected");
                    Err(error)
                }
            }
        })
    }
}
