//! # Lamina Core
//!
//! Core types for the Lamina handler-composition framework.
//!
//! This crate provides the building blocks shared by every composition mode:
//!
//! - [`HandlerError`] - Error value delivered to the completion callback
//! - [`LambdaContext`] - Raw platform context supplied with each invocation
//! - [`Context`] - Decorated context carrying a structured [`ContextLogger`]
//! - [`ContextDecorator`] - Turns a raw context into a decorated one
//! - [`Handler`] - A user handler in either returning or callback style
//! - [`hook`] - Lifecycle hook invocation (before, after, error)
//! - [`sanitize`] - Stack stripping before errors leave the system
//!
//! ## Outcomes
//!
//! Every unit of work (handler, middleware, hook) produces an [`Outcome`]:
//! `Ok(Some(value))` supplies a result, `Ok(None)` supplies nothing and keeps
//! whatever result is already in flight, and `Err(error)` rejects.

#![doc(html_root_url = "https://docs.rs/lamina-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod decorator;
mod error;
pub mod handler;
pub mod hook;
mod logger;
pub mod sanitize;
pub mod serialize;

use std::future::Future;
use std::pin::Pin;

pub use context::{Context, InvocationId, LambdaContext};
pub use decorator::ContextDecorator;
pub use error::HandlerError;
pub use handler::{Done, Handler, HandlerStyle};
pub use hook::{AfterHook, BeforeHook, ErrorHook, HookOutcome, Hooks};
pub use logger::{ContextLogger, LogLevel, ParseLevelError, LOG_TARGET};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The settled state of a handler, middleware, or whole invocation.
///
/// `Ok(None)` is the "no value" sentinel: it never overwrites a result that
/// is already in flight.
pub type Outcome = Result<Option<serde_json::Value>, HandlerError>;
