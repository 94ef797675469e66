//! End-to-end tests for middleware compositions built through the facade.

use lamina::prelude::*;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

fn raw() -> LambdaContext {
    LambdaContext::new("testFunction", "00112233445566778899", "$LATEST")
}

fn passthrough() -> impl Middleware {
    from_fn(|_, _, next: Next| async move { next.run().await })
}

#[tokio::test]
async fn test_chain_result_from_last_middleware() {
    let lambda = chain()
        .with(passthrough())
        .with(from_fn(|_, _, _| async move { Ok(Some(json!("done"))) }))
        .log_level(LogLevel::Info)
        .build();

    assert_eq!(lambda.invoke(json!({}), raw()).await, Ok(Some(json!("done"))));
}

#[tokio::test]
async fn test_empty_chain_yields_no_result() {
    let lambda = chain().log_level(LogLevel::Info).build();
    assert_eq!(lambda.invoke(json!({}), raw()).await, Ok(None));
}

#[tokio::test]
async fn test_wrapped_handler_runs_after_middleware() {
    let calls: Arc<Mutex<Vec<&'static str>>> = Arc::default();
    let (mw, handler) = (Arc::clone(&calls), Arc::clone(&calls));

    let lambda = wrap(Handler::from_fn(move |event, _| {
        handler.lock().push("handler");
        Ok(Some(event))
    }))
    .with(from_fn(move |_, _, next: Next| {
        let calls = Arc::clone(&mw);
        async move {
            calls.lock().push("middleware:before");
            let outcome = next.with_event(json!("from middleware")).await;
            calls.lock().push("middleware:after");
            outcome
        }
    }))
    .log_level(LogLevel::Info)
    .build();

    assert_eq!(
        lambda.invoke(json!("original"), raw()).await,
        Ok(Some(json!("from middleware")))
    );
    assert_eq!(
        *calls.lock(),
        vec!["middleware:before", "handler", "middleware:after"]
    );
}

#[tokio::test]
async fn test_middleware_catches_handler_error() {
    let lambda = wrap(Handler::from_fn(|_, _| Err(HandlerError::new("handler failed"))))
        .with(from_fn(|_, _, next: Next| async move {
            match next.run().await {
                Err(err) => Ok(Some(json!({ "caught": err.message }))),
                ok => ok,
            }
        }))
        .log_level(LogLevel::Info)
        .build();

    assert_eq!(
        lambda.invoke(json!({}), raw()).await,
        Ok(Some(json!({ "caught": "handler failed" })))
    );
}

#[tokio::test]
async fn test_chain_error_goes_through_hooks_and_sanitizer() {
    let lambda = chain()
        .with(passthrough())
        .with(from_fn(|_, _, next: Next| async move {
            next.fail(HandlerError::new("rejected")).await
        }))
        .on_error(|err, _, _| Err(HandlerError::named("Wrapped", err.message.clone())))
        .error_stack(false)
        .log_level(LogLevel::Info)
        .build();

    let err = lambda.invoke(json!({}), raw()).await.unwrap_err();

    assert_eq!(err.name, "Wrapped");
    assert_eq!(err.message, "rejected");
    assert_eq!(err.stack.as_deref(), Some(""));
}

#[tokio::test]
async fn test_middleware_context_replacement_reaches_handler_only() {
    let lambda = wrap(Handler::from_fn(|_, ctx| {
        Ok(Some(json!(ctx.get_str("tenant"))))
    }))
    .with(from_fn(|_, ctx: Context, next: Next| async move {
        next.with_context(ctx.with_field("tenant", "acme")).await
    }))
    .on_after(|result, _, ctx| {
        Ok(Some(json!({ "result": result, "hook_sees_tenant": ctx.get("tenant").is_some() })))
    })
    .log_level(LogLevel::Info)
    .build();

    assert_eq!(
        lambda.invoke(json!({}), raw()).await,
        Ok(Some(json!({ "result": "acme", "hook_sees_tenant": false })))
    );
}

#[tokio::test]
async fn test_strict_next_rejects_second_call() {
    let lambda = wrap(Handler::from_fn(|_, _| Ok(Some(json!("handler")))))
        .with(from_fn(|_, _, next: Next| async move {
            let _ = next.run().await;
            next.run().await
        }))
        .log_level(LogLevel::Info)
        .build();

    let err = lambda.invoke(json!({}), raw()).await.unwrap_err();
    assert!(err.is_reentrant_next());
}

#[tokio::test]
async fn test_lenient_next_allows_second_call() {
    let runs = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&runs);

    let lambda = wrap(Handler::from_fn(move |_, _| {
        *counter.lock() += 1;
        Ok(Some(json!("handler")))
    }))
    .with(from_fn(|_, _, next: Next| async move {
        let _ = next.run().await;
        next.run().await
    }))
    .strict_next(false)
    .log_level(LogLevel::Info)
    .build();

    assert_eq!(lambda.invoke(json!({}), raw()).await, Ok(Some(json!("handler"))));
    assert_eq!(*runs.lock(), 2);
}

#[tokio::test]
async fn test_builtin_stages_through_facade() {
    let lambda = wrap(Handler::from_fn(|_, ctx| {
        Ok(Some(json!({ "logger": ctx.log().name(), "level": ctx.log().level().as_str() })))
    }))
    .with(SanitizeErrorsMiddleware::new())
    .with(LoggingMiddleware::new(LogLevel::Debug))
    .log_level(LogLevel::Info)
    .build();

    assert_eq!(
        lambda.invoke(json!({}), raw()).await,
        Ok(Some(json!({ "logger": "testFunction", "level": "debug" })))
    );
}

#[tokio::test]
async fn test_callback_handler_inside_chain() {
    let lambda = wrap(Handler::callback(|_, _, done| async move {
        tokio::spawn(async move { done.succeed("later") });
        Ok(None)
    }))
    .with(passthrough())
    .log_level(LogLevel::Info)
    .build();

    assert_eq!(lambda.invoke(json!({}), raw()).await, Ok(Some(json!("later"))));
}
