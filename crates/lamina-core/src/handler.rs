//! User handlers and the dual-style invocation adapter.
//!
//! A handler is written in one of two styles:
//!
//! - **Returning**: `(event, context) -> Future<Outcome>`. The future's
//!   outcome is the handler's outcome.
//! - **Callback**: `(event, context, done) -> Future<Outcome>`. The handler
//!   settles the invocation by calling [`Done`], possibly from a task it
//!   spawned.
//!
//! The style is fixed by the constructor used, never guessed. [`invoke`]
//! runs either style and always yields exactly one [`Outcome`].
//!
//! # Example
//!
//! ```
//! use lamina_core::handler::{self, Handler};
//! use lamina_core::{ContextDecorator, LambdaContext};
//! use serde_json::json;
//!
//! # tokio_test_block_on(async {
//! let echo = Handler::returning(|event, _ctx| async move { Ok(Some(event)) });
//! let ctx = ContextDecorator::default().decorate(&LambdaContext::default());
//!
//! let outcome = handler::invoke(&echo, json!({"a": 1}), ctx).await;
//! assert_eq!(outcome, Ok(Some(json!({"a": 1}))));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use crate::context::Context;
use crate::error::HandlerError;
use crate::{BoxFuture, Outcome};
use futures_util::FutureExt;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

type ReturningFn = dyn Fn(Value, Context) -> BoxFuture<'static, Outcome> + Send + Sync;
type CallbackFn = dyn Fn(Value, Context, Done) -> BoxFuture<'static, Outcome> + Send + Sync;

/// The calling convention of a [`Handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStyle {
    /// The handler's returned outcome settles the invocation.
    Returning,
    /// The handler settles the invocation through a [`Done`] callback.
    Callback,
}

/// A user handler in either calling convention.
#[derive(Clone)]
pub enum Handler {
    /// `(event, context) -> Future<Outcome>`
    Returning(Arc<ReturningFn>),
    /// `(event, context, done) -> Future<Outcome>`
    Callback(Arc<CallbackFn>),
}

impl Handler {
    /// Creates a returning-style handler from an async function.
    pub fn returning<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self::Returning(Arc::new(move |event, ctx| Box::pin(f(event, ctx))))
    }

    /// Creates a callback-style handler.
    ///
    /// The handler's own returned outcome is only used when `done` is never
    /// called (see [`invoke`]).
    pub fn callback<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, Context, Done) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self::Callback(Arc::new(move |event, ctx, done| {
            Box::pin(f(event, ctx, done))
        }))
    }

    /// Creates a returning-style handler from a synchronous function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Value, Context) -> Outcome + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::Returning(Arc::new(move |event, ctx| {
            let f = Arc::clone(&f);
            Box::pin(async move { f(event, ctx) })
        }))
    }

    /// Returns the handler's calling convention.
    pub const fn style(&self) -> HandlerStyle {
        match self {
            Self::Returning(_) => HandlerStyle::Returning,
            Self::Callback(_) => HandlerStyle::Callback,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.style()).finish()
    }
}

/// Single-use completion callback for callback-style handlers.
///
/// Every method consumes the `Done`, so an invocation can only be settled
/// through it once. Dropping it without calling anything is allowed.
#[derive(Debug)]
pub struct Done {
    tx: oneshot::Sender<Outcome>,
}

impl Done {
    fn new() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Settles the invocation with `outcome`.
    pub fn send(self, outcome: Outcome) {
        // The receiver is gone only if the invocation already settled.
        let _ = self.tx.send(outcome);
    }

    /// Settles the invocation with a result.
    pub fn succeed(self, value: impl Into<Value>) {
        self.send(Ok(Some(value.into())));
    }

    /// Settles the invocation without a result.
    pub fn finish(self) {
        self.send(Ok(None));
    }

    /// Settles the invocation with an error.
    pub fn fail(self, error: impl Into<HandlerError>) {
        self.send(Err(error.into()));
    }
}

/// Runs `handler` once and returns its outcome.
///
/// For callback-style handlers:
///
/// - if `done` was called, its outcome wins over the returned one;
/// - if the handler returned `Err` without calling `done`, that error is the
///   outcome immediately;
/// - if it returned `Ok` while `done` is still alive (e.g. moved into a
///   spawned task), the adapter waits for `done`;
/// - if `done` is dropped unused, the returned outcome is used.
///
/// Panics in either style become a `Panic` error.
pub async fn invoke(handler: &Handler, event: Value, context: Context) -> Outcome {
    match handler {
        Handler::Returning(f) => {
            let f = Arc::clone(f);
            catch_panic(async move { f(event, context).await }).await
        }
        Handler::Callback(f) => {
            let f = Arc::clone(f);
            let (done, mut rx) = Done::new();
            let returned = catch_panic(async move { f(event, context, done).await }).await;

            match rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Closed) => returned,
                Err(TryRecvError::Empty) => match returned {
                    Err(error) => Err(error),
                    Ok(value) => rx.await.unwrap_or(Ok(value)),
                },
            }
        }
    }
}

/// Polls `future`, converting a panic into a `Panic` error.
pub async fn catch_panic<F>(future: F) -> Outcome
where
    F: Future<Output = Outcome>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let error = HandlerError::from_panic(payload.as_ref());
            tracing::warn!(error = %error, "handler panicked");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextDecorator, LambdaContext};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ctx() -> Context {
        ContextDecorator::default().decorate(&LambdaContext::new("fn", "req", "$LATEST"))
    }

    #[tokio::test]
    async fn test_returning_value() {
        let handler = Handler::returning(|_, _| async { Ok(Some(json!("foo"))) });
        assert_eq!(handler.style(), HandlerStyle::Returning);
        assert_eq!(invoke(&handler, json!({}), ctx()).await, Ok(Some(json!("foo"))));
    }

    #[tokio::test]
    async fn test_returning_nothing() {
        let handler = Handler::from_fn(|_, _| Ok(None));
        assert_eq!(invoke(&handler, json!({}), ctx()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_returning_error() {
        let handler = Handler::returning(|_, _| async { Err(HandlerError::new("boom")) });
        let err = invoke(&handler, json!({}), ctx()).await.unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[tokio::test]
    async fn test_callback_result() {
        let handler = Handler::callback(|_, _, done| async move {
            done.succeed("foo");
            Ok(None)
        });
        assert_eq!(handler.style(), HandlerStyle::Callback);
        assert_eq!(invoke(&handler, json!({}), ctx()).await, Ok(Some(json!("foo"))));
    }

    #[tokio::test]
    async fn test_callback_error() {
        let handler = Handler::callback(|_, _, done| async move {
            done.fail("Something went wrong");
            Ok(None)
        });
        let err = invoke(&handler, json!({}), ctx()).await.unwrap_err();
        assert_eq!(err.message, "Something went wrong");
    }

    #[tokio::test]
    async fn test_done_wins_over_returned_value() {
        let handler = Handler::callback(|_, _, done| async move {
            done.succeed("from done");
            Ok(Some(json!("from return")))
        });
        assert_eq!(invoke(&handler, json!({}), ctx()).await, Ok(Some(json!("from done"))));
    }

    #[tokio::test]
    async fn test_returned_error_before_done_rejects_immediately() {
        let handler = Handler::callback(|_, _, done| async move {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                done.succeed("too late");
            });
            Err(HandlerError::new("early"))
        });
        let err = invoke(&handler, json!({}), ctx()).await.unwrap_err();
        assert_eq!(err.message, "early");
    }

    #[tokio::test]
    async fn test_done_from_spawned_task() {
        let handler = Handler::callback(|event, _, done| async move {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.succeed(event);
            });
            Ok(None)
        });
        assert_eq!(
            invoke(&handler, json!({"late": true}), ctx()).await,
            Ok(Some(json!({"late": true})))
        );
    }

    #[tokio::test]
    async fn test_dropped_done_uses_returned_outcome() {
        let handler = Handler::callback(|_, _, done| async move {
            drop(done);
            Ok(Some(json!("returned")))
        });
        assert_eq!(invoke(&handler, json!({}), ctx()).await, Ok(Some(json!("returned"))));
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let handler = Handler::from_fn(|_, _| panic!("kaboom"));
        let err = invoke(&handler, json!({}), ctx()).await.unwrap_err();
        assert_eq!(err.name, "Panic");
        assert_eq!(err.message, "kaboom");
    }

    #[tokio::test]
    async fn test_panic_after_await_becomes_error() {
        let handler = Handler::callback(|_, _, _done| async move {
            tokio::task::yield_now().await;
            panic!("later kaboom");
        });
        let err = invoke(&handler, json!({}), ctx()).await.unwrap_err();
        assert_eq!(err.message, "later kaboom");
    }

    #[tokio::test]
    async fn test_handler_invoked_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = Handler::from_fn(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });
        let _ = invoke(&handler, json!({}), ctx()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
