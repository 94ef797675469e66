//! The wrapped, invocable handler.
//!
//! A [`LambdaFn`] owns everything fixed at composition time: the
//! composition (a single handler or a middleware chain), the lifecycle
//! hooks, the stack policy, and the context decorator. Each invocation runs:
//!
//! ```text
//! on_before ──▶ handler / chain ──▶ on_after ──▶ Ok(result)
//!     │               │                │
//!     └───────────────┴────────────────┴──▶ on_error ──▶ sanitize ──▶ Err(error)
//!                                               │
//!                                               └── recovered ──▶ on_after ──▶ Ok(result)
//! ```

use lamina_core::handler::{self, Handler};
use lamina_core::hook::{invoke_after_hook, invoke_before_hook, invoke_error_hook, Hooks};
use lamina_core::sanitize::sanitize;
use lamina_core::{Context, ContextDecorator, LambdaContext, Outcome};
use lamina_middleware::Chain;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// What runs between `on_before` and `on_after`.
#[derive(Debug, Clone)]
pub(crate) enum Composition {
    /// A single handler.
    Handler(Handler),
    /// A middleware chain, possibly ending in a handler.
    Chain(Chain),
}

impl Composition {
    async fn run(&self, event: Value, context: Context) -> Outcome {
        match self {
            Self::Handler(handler) => handler::invoke(handler, event, context).await,
            Self::Chain(chain) => chain.dispatch(event, context).await,
        }
    }
}

#[derive(Debug)]
struct Inner {
    composition: Composition,
    hooks: Hooks,
    error_stack: bool,
    decorator: ContextDecorator,
}

/// A composed handler, ready to be invoked.
///
/// Cloning is cheap and clones share the same composition. Concurrent
/// invocations never share state.
#[derive(Debug, Clone)]
pub struct LambdaFn {
    inner: Arc<Inner>,
}

impl LambdaFn {
    pub(crate) fn new(
        composition: Composition,
        hooks: Hooks,
        error_stack: bool,
        decorator: ContextDecorator,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                composition,
                hooks,
                error_stack,
                decorator,
            }),
        }
    }

    /// Returns `true` if delivered errors keep their stack.
    pub fn error_stack(&self) -> bool {
        self.inner.error_stack
    }

    /// Returns the decorator used for every invocation.
    pub fn decorator(&self) -> ContextDecorator {
        self.inner.decorator
    }

    /// Invokes with a raw platform context.
    ///
    /// The context is decorated first; the caller's value is not modified.
    pub async fn invoke(&self, event: Value, context: LambdaContext) -> Outcome {
        let context = self.inner.decorator.decorate(&context);
        self.run(event, context).await
    }

    /// Invokes and also reports the outcome to `callback`.
    ///
    /// `callback` is called exactly once, with the same outcome that is
    /// returned.
    pub async fn invoke_with_callback<F>(&self, event: Value, context: LambdaContext, callback: F) -> Outcome
    where
        F: FnOnce(Outcome),
    {
        let outcome = self.invoke(event, context).await;
        callback(outcome.clone());
        outcome
    }

    /// Invokes with an already decorated context.
    pub async fn run(&self, event: Value, context: Context) -> Outcome {
        let hooks = &self.inner.hooks;

        let (event, attempt) = match invoke_before_hook(hooks.on_before.as_ref(), event.clone(), &context) {
            Ok(event) => {
                let attempt = self
                    .inner
                    .composition
                    .run(event.clone(), context.clone())
                    .await
                    .and_then(|result| invoke_after_hook(hooks.on_after.as_ref(), result, &event, &context));
                (event, attempt)
            }
            Err(error) => (event, Err(error)),
        };

        let outcome = match attempt {
            Ok(result) => Ok(result),
            Err(error) => {
                debug!(error = %error, "invocation failed");
                match invoke_error_hook(hooks.on_error.as_ref(), error, &event, &context) {
                    Ok(recovered) => {
                        debug!("error hook recovered a result");
                        invoke_after_hook(hooks.on_after.as_ref(), Some(recovered), &event, &context)
                    }
                    Err(error) => Err(error),
                }
            }
        };

        outcome.map_err(|error| sanitize(error, self.inner.error_stack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamina_core::{HandlerError, LogLevel};
    use serde_json::json;

    fn lambda(handler: Handler, hooks: Hooks, error_stack: bool) -> LambdaFn {
        LambdaFn::new(
            Composition::Handler(handler),
            hooks,
            error_stack,
            ContextDecorator::new(LogLevel::Info),
        )
    }

    #[tokio::test]
    async fn test_plain_value() {
        let f = lambda(Handler::from_fn(|_, _| Ok(Some(json!(42)))), Hooks::default(), true);
        assert_eq!(f.invoke(json!({}), LambdaContext::default()).await, Ok(Some(json!(42))));
    }

    #[tokio::test]
    async fn test_error_is_sanitized() {
        let f = lambda(
            Handler::from_fn(|_, _| Err(HandlerError::new("x"))),
            Hooks::default(),
            false,
        );
        let err = f.invoke(json!({}), LambdaContext::default()).await.unwrap_err();
        assert_eq!(err.message, "x");
        assert_eq!(err.stack.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_before_replaces_event() {
        let hooks = Hooks {
            on_before: Some(Arc::new(|_, _| Ok(Some(json!("replaced"))))),
            ..Hooks::default()
        };
        let f = lambda(Handler::from_fn(|event, _| Ok(Some(event))), hooks, true);
        assert_eq!(
            f.invoke(json!("original"), LambdaContext::default()).await,
            Ok(Some(json!("replaced")))
        );
    }

    #[tokio::test]
    async fn test_callback_receives_same_outcome() {
        let f = lambda(Handler::from_fn(|_, _| Ok(Some(json!("same")))), Hooks::default(), true);
        let mut delivered = None;
        let returned = f
            .invoke_with_callback(json!({}), LambdaContext::default(), |outcome| {
                delivered = Some(outcome);
            })
            .await;
        assert_eq!(delivered, Some(returned));
    }
}
