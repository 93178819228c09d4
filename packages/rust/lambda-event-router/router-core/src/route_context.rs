use std::collections::HashMap;
use std::sync::Arc;

use crate::NormalizedEvent;

/// Context passed to route handlers containing request information and application state.
///
/// `event` is the event produced by the last middleware that rewrote it, with
/// the matched path parameters already merged into `event.path_params`.
///
/// # Examples
///
/// ```rust
/// use lambda_event_router_core::{Error, NormalizedResult, RouteContext};
/// use serde_json::json;
///
/// async fn handle_user(ctx: RouteContext<()>) -> Result<NormalizedResult, Error> {
///     let user_id = ctx.get_param_or("id", "anonymous");
///     Ok(NormalizedResult::json(200, &json!({
///         "id": user_id,
///         "method": ctx.method(),
///         "route": ctx.route_pattern(),
///     })))
/// }
/// ```
#[derive(Debug)]
pub struct RouteContext<State> {
    /// The path used for matching (trailing slash and stage removed)
    pub path: String,
    /// The upper-cased HTTP method
    pub method: String,
    /// Path parameters extracted from the URL (e.g., `:id` -> "123")
    pub params: HashMap<String, String>,
    /// Application state shared across all requests
    pub state: Arc<State>,
    /// The event after the middleware chain
    pub event: NormalizedEvent,
    /// The route template pattern (e.g., "/quote/:id")
    pub route_pattern: String,
    /// Whether the route was registered with `auth`; the router does not enforce it
    pub requires_auth: bool,
}

impl<State> Clone for RouteContext<State> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            method: self.method.clone(),
            params: self.params.clone(),
            state: Arc::clone(&self.state),
            event: self.event.clone(),
            route_pattern: self.route_pattern.clone(),
            requires_auth: self.requires_auth,
        }
    }
}

impl<State> RouteContext<State> {
    /// Returns the normalized request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP method of the current request (e.g., "GET", "POST").
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns a reference to the shared application state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use lambda_event_router_core::RouteContext;
    /// struct AppState {
    ///     api_key: String,
    /// }
    ///
    /// async fn handler(ctx: RouteContext<AppState>) {
    ///     let api_key = &ctx.state().api_key;
    ///     // Use the API key for authentication
    /// }
    /// ```
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn event(&self) -> &NormalizedEvent {
        &self.event
    }

    pub fn route_pattern(&self) -> &str {
        &self.route_pattern
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Returns a path parameter by name, if it exists.
    ///
    /// For the pattern "/users/:id" and the path "/users/123",
    /// `get_param("id")` returns `Some("123")`.
    pub fn get_param(&self, name: &str) -> Option<String> {
        self.params.get(name).cloned()
    }

    /// Returns a path parameter by name, or a default value if it doesn't exist.
    pub fn get_param_or(&self, name: &str, default: &str) -> String {
        self.get_param(name).unwrap_or_else(|| default.to_string())
    }

    /// Returns a path parameter by name, or an empty string if it doesn't exist.
    pub fn get_param_or_empty(&self, name: &str) -> String {
        self.get_param_or(name, "")
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
}
