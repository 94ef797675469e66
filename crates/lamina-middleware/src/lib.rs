//! # Lamina Middleware
//!
//! Onion-style middleware chain for the Lamina framework.
//!
//! A [`Chain`] is an ordered, immutable list of [`Middleware`]. Each
//! invocation runs the chain from the first middleware downstream; code after
//! a middleware's `next` call runs on the way back up, in reverse order.
//!
//! ```text
//! invoke → m1 ──next──▶ m2 ──next──▶ handler
//!          m1 ◀───────── m2 ◀───────── result
//! ```
//!
//! ## Continuation
//!
//! Every middleware receives a [`Next`] handle. Through it a middleware can:
//!
//! - continue with [`Next::run`];
//! - replace the context or event seen by everything downstream
//!   ([`Next::with_context`], [`Next::with_event`]);
//! - short-circuit with an error ([`Next::fail`]);
//! - observe a downstream failure by matching on the awaited outcome, and
//!   suppress or rethrow it.
//!
//! A middleware that returns a value without calling `next` supplies the
//! invocation's result and stops the chain there.
//!
//! ## Example
//!
//! ```
//! use lamina_core::{ContextDecorator, LambdaContext};
//! use lamina_middleware::{from_fn, Chain};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let chain = Chain::builder()
//!     .with(from_fn(|_event, _ctx, next| async move { next.run().await }))
//!     .with(from_fn(|_event, _ctx, _next| async move { Ok(Some(json!("done"))) }))
//!     .build();
//!
//! let ctx = ContextDecorator::default().decorate(&LambdaContext::default());
//! assert_eq!(chain.dispatch(json!({}), ctx).await, Ok(Some(json!("done"))));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/lamina-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dispatcher;
pub mod middleware;
pub mod stages;

pub use dispatcher::{Chain, ChainBuilder};
pub use middleware::{from_fn, FnMiddleware, HandlerMiddleware, Middleware, Next, Resume};
