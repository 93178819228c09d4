//! Registered routes and route selection.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::path::PathPattern;
use crate::{Error, NormalizedResult, RouteContext};

pub(crate) type HandlerFuture = Pin<Box<dyn Future<Output = Result<NormalizedResult, Error>> + Send>>;

pub(crate) type BoxedHandler<State> = dyn Fn(RouteContext<State>) -> HandlerFuture + Send + Sync;

/// Per-route registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Marks the route as requiring authentication. The router only records
    /// it; enforcement belongs to a middleware or the handler.
    pub auth: bool,
}

impl RouteOptions {
    pub fn with_auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }
}

/// A (method, pattern, handler) registration.
pub struct Route<State> {
    method: String,
    pattern: PathPattern,
    handler: Arc<BoxedHandler<State>>,
    requires_auth: bool,
}

impl<State> Route<State> {
    pub(crate) fn new(
        method: &str,
        pattern: &str,
        handler: Arc<BoxedHandler<State>>,
        options: RouteOptions,
    ) -> Self {
        Self {
            method: method.to_uppercase(),
            pattern: PathPattern::parse(pattern),
            handler,
            requires_auth: options.auth,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub(crate) fn call(&self, ctx: RouteContext<State>) -> HandlerFuture {
        (self.handler)(ctx)
    }
}

impl<State> std::fmt::Debug for Route<State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("requires_auth", &self.requires_auth)
            .field("handler", &format_args!("<function>"))
            .finish()
    }
}

/// Outcome of route selection. Not found is an ordinary value, not an error.
pub(crate) enum Selection<'a, State> {
    Found {
        route: &'a Route<State>,
        params: HashMap<String, String>,
    },
    NotFound,
}

/// Routes in registration order. Frozen once the router is built.
pub(crate) struct RouteTable<State> {
    routes: Vec<Route<State>>,
}

impl<State> RouteTable<State> {
    pub(crate) fn new(routes: Vec<Route<State>>) -> Self {
        Self { routes }
    }

    pub(crate) fn routes(&self) -> &[Route<State>] {
        &self.routes
    }

    /// First route, in registration order, whose method equals `method` and
    /// whose pattern matches `path`. No specificity ranking.
    pub(crate) fn select(&self, method: &str, path: &str) -> Selection<'_, State> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route
                    .pattern
                    .matches(path)
                    .map(|params| Selection::Found { route, params })
            })
            .unwrap_or(Selection::NotFound)
    }
}
