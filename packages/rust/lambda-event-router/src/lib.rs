//! lambda-event-router is a minimal router for HTTP events delivered to AWS Lambda.
//!
//! Incoming events from API Gateway (HTTP API v2, REST API v1) or an Application Load
//! Balancer are normalized into a [`NormalizedEvent`], matched against `:param` path
//! patterns, passed through an ordered chain of middlewares, handed to a route handler,
//! and the handler's [`NormalizedResult`] is folded through a chain of response parsers.
//!
//! # Features
//!
//! * `:param` path parameters, trailing-slash and stage-prefix insensitive matching
//! * Middlewares that can rewrite the event or answer early
//! * Response parsers applied to every outcome, 404s included
//! * Handler failures and panics turned into HTTP responses; dispatch never fails
//! * Route registration via the `#[route]` attribute
//! * Bundled [`JsonBody`] and [`RateLimiter`] middlewares
//!
//! # Quick Start
//!
//! ```rust
//! use lambda_event_router::{add_content_type_json, NormalizedEvent, NormalizedResult, Router};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let router = Router::<()>::builder()
//!     .post("/teste", |_ctx| async {
//!         Ok(NormalizedResult::json(200, &json!({ "message": "Health!" })))
//!     })
//!     .parser(add_content_type_json)
//!     .build(());
//!
//! let result = router.call(NormalizedEvent::new("POST", "/teste")).await;
//! assert_eq!(result.status_code, 200);
//! assert_eq!(result.body.as_deref(), Some(r#"{"message":"Health!"}"#));
//! # });
//! ```
//!
//! # Attribute Routes
//!
//! The module name given to [`define_router!`] must match the `module` parameter of the
//! route handlers:
//!
//! ```rust
//! use lambda_event_router::{define_router, route, Error, NormalizedResult};
//! use serde_json::json;
//!
//! struct AppState {
//!     greeting: String,
//! }
//!
//! define_router!(module = api_router, state = AppState);
//!
//! #[route(path = "/hello/:name", module = "api_router")]
//! async fn handle_hello(ctx: api_router::RouteContext) -> Result<NormalizedResult, Error> {
//!     let name = ctx.get_param_or("name", "World");
//!     Ok(NormalizedResult::json(
//!         200,
//!         &json!({ "message": format!("{}, {}!", ctx.state().greeting, name) }),
//!     ))
//! }
//!
//! # fn main() {}
//! ```

pub use lambda_event_router_core::*;
pub use lambda_event_router_macro::route;

/// Defines a router module with type aliases bound to your state type.
///
/// # Type Aliases
///
/// * `State` - The application state type
/// * `Router` - The router instance type for your application
/// * `RouterBuilder` - The builder type for constructing routers
/// * `RouteContext` - The context type passed to route handlers
///
/// # Arguments
///
/// * `module` - The module name (optional, defaults to an internal name)
/// * `state` - The state type for the router
///
/// # Examples
///
/// ```rust,no_run
/// use lambda_event_router::define_router;
///
/// struct AppState {}
///
/// define_router!(state = AppState);
///
/// # fn main() {
/// // Router, RouterBuilder and RouteContext are now in scope
/// let router: Router = RouterBuilder::from_registry().build(AppState {});
/// # }
/// ```
///
/// Several routers in one application, each with its own module:
///
/// ```rust,no_run
/// use lambda_event_router::define_router;
///
/// struct PublicState {}
/// struct AdminState {}
///
/// define_router!(module = public_router, state = PublicState);
/// define_router!(module = admin_router, state = AdminState);
///
/// # fn main() {
/// let public = public_router::RouterBuilder::from_registry().build(PublicState {});
/// let admin = admin_router::RouterBuilder::from_registry().build(AdminState {});
/// # }
/// ```
#[macro_export]
macro_rules! define_router {
    (module = $module:ident, state = $state_type:ty) => {
        pub mod $module {
            use super::*;

            pub type State = $state_type;
            pub type Router = ::lambda_event_router::Router<State>;
            pub type RouterBuilder = ::lambda_event_router::RouterBuilder<State>;
            pub type RouteContext = ::lambda_event_router::RouteContext<State>;
        }
        pub use $module::*;
    };

    (state = $state_type:ty) => {
        mod __lambda_event_router_default_router {
            use super::*;

            pub type State = $state_type;
            pub type Router = ::lambda_event_router::Router<State>;
            pub type RouterBuilder = ::lambda_event_router::RouterBuilder<State>;
            pub type RouteContext = ::lambda_event_router::RouteContext<State>;
        }
        pub use __lambda_event_router_default_router::*;
    };
}

#[cfg(doctest)]
extern crate doc_comment;

#[cfg(doctest)]
use doc_comment::doctest;

#[cfg(doctest)]
doctest!("../README.md", readme);
