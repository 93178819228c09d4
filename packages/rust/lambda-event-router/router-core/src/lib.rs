//! Core functionality for the lambda-event-router crate.
//!
//! **Note**: This is an implementation crate for [lambda-event-router](https://crates.io/crates/lambda-event-router)
//! and is not meant to be used directly. Please use the main crate instead.
//!
//! The functionality in this crate is re-exported by the main crate, and using it directly
//! may lead to version conflicts or other issues. Additionally, this crate's API is not
//! guaranteed to be stable between minor versions.
//!
//! # Architecture
//!
//! - [`NormalizedEvent`] / [`NormalizedResult`]: the request and response crossing the router
//! - [`match_path`]: `:param` path pattern matching
//! - [`Middleware`]: ordered pre-processing that may rewrite the event or answer early
//! - [`Parser`]: post-processing applied to every result
//! - [`Router`] / [`RouterBuilder`]: registration and dispatch
//!
//! # Usage
//!
//! Instead of using this crate directly, use the main crate:
//!
//! ```toml
//! [dependencies]
//! lambda-event-router = "0.1"
//! ```

pub use ctor;

pub mod constants;
mod counter_store;
mod error;
mod event;
mod middleware;
pub mod middlewares;
mod parser;
mod path;
mod route_context;
mod route_table;
mod router;

pub use counter_store::{CounterStore, InMemoryCounterStore};
pub use error::{Error, HttpError};
pub use event::{NormalizedEvent, NormalizedResult};
pub use middleware::{from_fn, Middleware, MiddlewareAction, MiddlewareFn};
pub use middlewares::{JsonBody, RateLimiter};
pub use parser::{add_content_type_json, Parser};
pub use path::{match_path, normalize_path};
pub use route_context::RouteContext;
pub use route_table::{Route, RouteOptions};
pub use router::{register_route, Router, RouterBuilder};
