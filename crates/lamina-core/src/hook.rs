//! Lifecycle hooks.
//!
//! A wrapped handler may register three optional hooks:
//!
//! - `on_before(event, context)` runs before the handler and may replace the
//!   event.
//! - `on_after(result, event, context)` runs after a successful invocation
//!   and may replace the result.
//! - `on_error(error, event, context)` runs after any failure and may
//!   recover with a result.
//!
//! Every hook returns a [`HookOutcome`]: `Ok(Some(v))` replaces the primary
//! value, `Ok(None)` keeps it, and `Err(e)` fails.

use crate::context::Context;
use crate::error::HandlerError;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// What a hook produced: a replacement, nothing, or an error.
pub type HookOutcome<T> = Result<Option<T>, HandlerError>;

/// Hook run before the handler. Receives the event.
pub type BeforeHook = Arc<dyn Fn(&Value, &Context) -> HookOutcome<Value> + Send + Sync>;

/// Hook run after a successful invocation. Receives the result.
pub type AfterHook =
    Arc<dyn Fn(&Option<Value>, &Value, &Context) -> HookOutcome<Value> + Send + Sync>;

/// Hook run after a failed invocation. Receives the error.
pub type ErrorHook =
    Arc<dyn Fn(&HandlerError, &Value, &Context) -> HookOutcome<Value> + Send + Sync>;

/// The set of hooks registered on a wrapped handler.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Runs before the handler.
    pub on_before: Option<BeforeHook>,
    /// Runs after a successful invocation.
    pub on_after: Option<AfterHook>,
    /// Runs after a failed invocation.
    pub on_error: Option<ErrorHook>,
}

impl Hooks {
    /// Returns `true` if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.on_before.is_none() && self.on_after.is_none() && self.on_error.is_none()
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_before", &self.on_before.is_some())
            .field("on_after", &self.on_after.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Runs an optional hook against a primary value.
///
/// An absent hook returns `primary` unchanged. A present hook's replacement
/// is converted into the primary type; `Ok(None)` keeps `primary`. A panic
/// in the hook becomes a `Panic` error.
///
/// # Example
///
/// ```
/// use lamina_core::hook::{invoke_hook, HookOutcome};
/// use lamina_core::{Context, ContextDecorator, LambdaContext};
/// use serde_json::{json, Value};
///
/// let ctx = ContextDecorator::default().decorate(&LambdaContext::default());
/// let upper = |v: &Value, _: &Value, _: &Context| -> HookOutcome<Value> {
///     Ok(v.as_str().map(|s| Value::from(s.to_uppercase())))
/// };
///
/// let out = invoke_hook(Some(&upper), json!("foo"), &json!({}), &ctx);
/// assert_eq!(out, Ok(json!("FOO")));
/// ```
pub fn invoke_hook<P, R, H>(
    hook: Option<&H>,
    primary: P,
    event: &Value,
    context: &Context,
) -> Result<P, HandlerError>
where
    H: Fn(&P, &Value, &Context) -> HookOutcome<R> + ?Sized,
    R: Into<P>,
{
    let Some(hook) = hook else {
        return Ok(primary);
    };

    let replacement = guarded(|| hook(&primary, event, context))?;
    Ok(replacement.map_or(primary, Into::into))
}

/// Runs the optional `on_before` hook and returns the event to use.
pub fn invoke_before_hook(
    hook: Option<&BeforeHook>,
    event: Value,
    context: &Context,
) -> Result<Value, HandlerError> {
    let Some(hook) = hook else {
        return Ok(event);
    };

    let replacement = guarded(|| hook(&event, context))?;
    Ok(replacement.unwrap_or(event))
}

/// Runs the optional `on_after` hook against a result.
pub fn invoke_after_hook(
    hook: Option<&AfterHook>,
    result: Option<Value>,
    event: &Value,
    context: &Context,
) -> Result<Option<Value>, HandlerError> {
    invoke_hook(hook.map(AsRef::as_ref), result, event, context)
}

/// Runs the optional `on_error` hook.
///
/// Returns `Ok(value)` if the hook recovered, or `Err` with either the
/// original error (no hook, or the hook returned nothing) or the hook's own
/// error.
pub fn invoke_error_hook(
    hook: Option<&ErrorHook>,
    error: HandlerError,
    event: &Value,
    context: &Context,
) -> Result<Value, HandlerError> {
    let Some(hook) = hook else {
        return Err(error);
    };

    match guarded(|| hook(&error, event, context))? {
        Some(recovered) => Ok(recovered),
        None => Err(error),
    }
}

fn guarded<T>(f: impl FnOnce() -> HookOutcome<T>) -> HookOutcome<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let error = HandlerError::from_panic(payload.as_ref());
        tracing::warn!(error = %error, "hook panicked");
        Err(error)
    })
}
