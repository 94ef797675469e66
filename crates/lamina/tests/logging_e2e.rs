//! Context logger output observed through a `tracing` subscriber.

use lamina::prelude::*;
use parking_lot::Mutex;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn subscriber(captured: &Captured) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish()
}

fn raw() -> LambdaContext {
    LambdaContext::new("testFunction", "00112233445566778899", "$LATEST")
}

#[tokio::test]
async fn test_handler_log_lines_carry_invocation_fields() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let lambda = wrap(Handler::from_fn(|_, ctx| {
        ctx.log().info("handled");
        Ok(None)
    }))
    .log_level(LogLevel::Info)
    .build();

    lambda.invoke(json!({}), raw()).await.unwrap();

    let lines = captured.lines();
    let line = lines
        .iter()
        .find(|l| l.contains("handled"))
        .expect("handler record");
    assert!(line.contains("testFunction"));
    assert!(line.contains("00112233445566778899"));
    assert!(line.contains("$LATEST"));
    assert!(line.contains("invocationId"));
}

#[tokio::test]
async fn test_records_below_configured_level_are_dropped() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let lambda = wrap(Handler::from_fn(|_, ctx| {
        ctx.log().debug("quiet");
        ctx.log().error("loud");
        Ok(None)
    }))
    .log_level(LogLevel::Warn)
    .build();

    lambda.invoke(json!({}), raw()).await.unwrap();

    let lines = captured.lines();
    assert!(lines.iter().any(|l| l.contains("loud")));
    assert!(!lines.iter().any(|l| l.contains("quiet")));
}

#[tokio::test]
async fn test_each_invocation_gets_its_own_id() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let lambda = wrap(Handler::from_fn(|_, ctx| {
        Ok(ctx.log().fields().get("invocationId").cloned())
    }))
    .log_level(LogLevel::Info)
    .build();

    let first = lambda.invoke(json!({}), raw()).await.unwrap();
    let second = lambda.invoke(json!({}), raw()).await.unwrap();

    assert!(first.is_some());
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_reentrant_next_is_reported() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(&captured));

    let lambda = chain()
        .with(from_fn(|_, _, next: Next| async move {
            let _ = next.run().await;
            next.run().await
        }))
        .log_level(LogLevel::Info)
        .build();

    assert!(lambda.invoke(json!({}), raw()).await.is_err());
    assert!(captured
        .lines()
        .iter()
        .any(|l| l.contains("WARN") && l.contains("called more than once")));
}

#[tokio::test]
async fn test_logging_stage_keeps_invocation_id_for_hooks_and_handler() {
    let lambda = wrap(Handler::from_fn(|_, ctx| {
        Ok(ctx.log().fields().get("invocationId").cloned())
    }))
    .with(LoggingMiddleware::new(LogLevel::Debug))
    .on_after(|result, _, ctx| {
        Ok(Some(json!({
            "handler": result,
            "hook": ctx.log().fields().get("invocationId"),
        })))
    })
    .log_level(LogLevel::Info)
    .build();

    let outcome = lambda.invoke(json!({}), raw()).await.unwrap().unwrap();

    assert!(outcome["hook"].is_string());
    assert_eq!(outcome["handler"], outcome["hook"]);
}
