use futures_util::FutureExt;
use lambda_runtime::LambdaEvent;
use lazy_static::lazy_static;
use opentelemetry::global;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{field, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::constants::status;
use crate::error::{failure_result, Panicked};
use crate::middleware::{run_chain, ChainOutcome};
use crate::parser::apply_parsers;
use crate::path::normalize_path;
use crate::route_table::{BoxedHandler, HandlerFuture, Route, RouteOptions, RouteTable, Selection};
use crate::{Error, Middleware, NormalizedEvent, NormalizedResult, Parser, RouteContext};

lazy_static! {
    static ref ROUTE_REGISTRY: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>> =
        Mutex::new(HashMap::new());
}

/// The dispatcher: matches events against routes, runs the middleware chain,
/// invokes the handler and folds the result through the parsers.
///
/// A router is only obtained from a finished [`RouterBuilder`], so its routes,
/// middlewares and parsers never change while it serves requests. It can be
/// shared between concurrent requests without locking.
///
/// # Type Parameters
///
/// * `State` - The type of the application state shared across handlers
///
/// # Examples
///
/// ```rust
/// use lambda_event_router_core::{add_content_type_json, NormalizedEvent, NormalizedResult, Router};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let router = Router::<()>::builder()
///     .get("/hello/:name", |ctx| async move {
///         let name = ctx.get_param_or("name", "World");
///         Ok(NormalizedResult::json(200, &json!({ "message": format!("Hello, {}!", name) })))
///     })
///     .parser(add_content_type_json)
///     .build(());
///
/// let result = router.call(NormalizedEvent::new("GET", "/hello/Lambda")).await;
/// assert_eq!(result.status_code, 200);
/// assert_eq!(result.headers["Content-Type"], "application/json");
/// # });
/// ```
pub struct Router<State> {
    routes: RouteTable<State>,
    middlewares: Vec<Arc<dyn Middleware>>,
    parsers: Vec<Arc<dyn Parser>>,
    state: Arc<State>,
}

impl<State> Router<State>
where
    State: Send + Sync + 'static,
{
    pub fn builder() -> RouterBuilder<State> {
        RouterBuilder::new()
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> &[Route<State>] {
        self.routes.routes()
    }

    pub fn state(&self) -> &Arc<State> {
        &self.state
    }

    /// Dispatches one event. Always resolves to a result: unmatched requests
    /// become a 404, failures and panics in middlewares or handlers become an
    /// error result, and every outcome passes through the parsers.
    pub async fn call(&self, event: NormalizedEvent) -> NormalizedResult {
        let method = event.method.to_uppercase();
        let path = normalize_path(&event.path, &event.stage);

        let span = tracing::info_span!(
            "router.call",
            otel.name = %method,
            otel.kind = "SERVER",
            otel.status_code = field::Empty,
            http.request.method = %method,
            http.route = field::Empty,
            http.response.status_code = field::Empty,
            url.path = %event.path,
            client.address = %event.source_ip,
        );

        // Extract parent context from headers
        let parent_cx =
            global::get_text_map_propagator(|propagator| propagator.extract(&event.headers));
        span.set_parent(parent_cx);

        let result = self
            .dispatch(event, &method, &path)
            .instrument(span.clone())
            .await;
        Self::record_response(&span, &result);
        result
    }

    /// Lambda runtime entry point. Converts the payload with `Into` and never
    /// returns `Err`.
    ///
    /// ```rust,no_run
    /// use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
    /// use lambda_event_router_core::{NormalizedResult, Router};
    /// use lambda_runtime::{service_fn, Error, LambdaEvent};
    /// use std::sync::Arc;
    ///
    /// # async fn run() -> Result<(), Error> {
    /// let router = Arc::new(
    ///     Router::<()>::builder()
    ///         .get("/health", |_| async { Ok(NormalizedResult::new(200)) })
    ///         .build(()),
    /// );
    ///
    /// lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| {
    ///     let router = Arc::clone(&router);
    ///     async move { router.handle_request(event).await }
    /// }))
    /// .await
    /// # }
    /// ```
    pub async fn handle_request<E>(&self, event: LambdaEvent<E>) -> Result<NormalizedResult, Error>
    where
        E: Into<NormalizedEvent>,
    {
        let (payload, lambda_context) = event.into_parts();
        tracing::debug!(request_id = %lambda_context.request_id, "routing lambda invocation");
        Ok(self.call(payload.into()).await)
    }

    async fn dispatch(&self, event: NormalizedEvent, method: &str, path: &str) -> NormalizedResult {
        let result = match self.routes.select(method, path) {
            Selection::NotFound => {
                tracing::debug!(method, path, "no route matched");
                not_found(method, path)
            }
            Selection::Found { route, params } => {
                let span = Span::current();
                span.record("http.route", route.pattern());
                span.record("otel.name", format!("{} {}", method, route.pattern()).as_str());

                self.execute(route, params, event, method, path)
                    .await
                    .unwrap_or_else(|error| failure_result(&error))
            }
        };

        apply_parsers(&self.parsers, result)
    }

    // Everything that can fail runs here, so `dispatch` has a single place
    // turning failures into results.
    async fn execute(
        &self,
        route: &Route<State>,
        params: HashMap<String, String>,
        event: NormalizedEvent,
        method: &str,
        path: &str,
    ) -> Result<NormalizedResult, Error> {
        let mut path_params = event.path_params.clone();
        path_params.extend(params.clone());
        let event = NormalizedEvent {
            path_params,
            ..event
        };

        let event = match contain(run_chain(&self.middlewares, event)).await? {
            ChainOutcome::Proceed(event) => event,
            ChainOutcome::ShortCircuit(result) => return Ok(result),
        };

        let ctx = RouteContext {
            path: path.to_string(),
            method: method.to_string(),
            params,
            state: Arc::clone(&self.state),
            event,
            route_pattern: route.pattern().to_string(),
            requires_auth: route.requires_auth(),
        };

        // The handler closure itself may panic before returning its future
        contain(async move { route.call(ctx).await }).await
    }

    fn record_response(span: &Span, result: &NormalizedResult) {
        span.record("http.response.status_code", result.status_code);

        // For server spans only 5xx responses are errors
        if (500..600).contains(&result.status_code) {
            span.record("otel.status_code", "ERROR");
        }
    }
}

fn not_found(method: &str, path: &str) -> NormalizedResult {
    NormalizedResult::message(
        status::NOT_FOUND,
        &format!("Not found: {} {}", method, path),
    )
}

/// Awaits a fallible step, turning a panic into an ordinary error.
async fn contain<T, F>(future: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(Panicked::from_payload(payload).into()),
    }
}

/// Collects routes, middlewares and parsers, then freezes them into a [`Router`].
///
/// # Examples
///
/// ```rust
/// use lambda_event_router_core::{
///     from_fn, Error, MiddlewareAction, NormalizedResult, RouteContext, RouteOptions, RouterBuilder,
/// };
///
/// #[derive(Clone)]
/// struct State {}
///
/// async fn get_users(_ctx: RouteContext<State>) -> Result<NormalizedResult, Error> {
///     Ok(NormalizedResult::new(200).with_body(r#"{"users":[]}"#))
/// }
///
/// async fn delete_user(ctx: RouteContext<State>) -> Result<NormalizedResult, Error> {
///     Ok(NormalizedResult::new(200).with_body(ctx.get_param_or_empty("id")))
/// }
///
/// let router = RouterBuilder::<State>::new()
///     .middleware(from_fn(|_| async { Ok(MiddlewareAction::Continue) }))
///     .get("/users", get_users)
///     .route_with_options("DELETE", "/users/:id", RouteOptions::default().with_auth(true), delete_user)
///     .build(State {});
///
/// assert_eq!(router.routes().len(), 2);
/// assert!(router.routes()[1].requires_auth());
/// ```
pub struct RouterBuilder<State> {
    routes: Vec<Route<State>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    parsers: Vec<Arc<dyn Parser>>,
}

impl<State> RouterBuilder<State>
where
    State: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middlewares: Vec::new(),
            parsers: Vec::new(),
        }
    }

    pub fn route<F, Fut>(self, method: &str, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteContext<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NormalizedResult, Error>> + Send + 'static,
    {
        self.route_with_options(method, pattern, RouteOptions::default(), handler)
    }

    pub fn route_with_options<F, Fut>(
        mut self,
        method: &str,
        pattern: &str,
        options: RouteOptions,
        handler: F,
    ) -> Self
    where
        F: Fn(RouteContext<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NormalizedResult, Error>> + Send + 'static,
    {
        let handler: Arc<BoxedHandler<State>> =
            Arc::new(move |ctx: RouteContext<State>| Box::pin(handler(ctx)) as HandlerFuture);
        self.routes
            .push(Route::new(method, pattern, handler, options));
        self
    }

    pub fn get<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteContext<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NormalizedResult, Error>> + Send + 'static,
    {
        self.route("GET", pattern, handler)
    }

    pub fn post<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteContext<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NormalizedResult, Error>> + Send + 'static,
    {
        self.route("POST", pattern, handler)
    }

    pub fn put<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteContext<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NormalizedResult, Error>> + Send + 'static,
    {
        self.route("PUT", pattern, handler)
    }

    pub fn delete<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(RouteContext<State>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NormalizedResult, Error>> + Send + 'static,
    {
        self.route("DELETE", pattern, handler)
    }

    /// Appends a middleware; middlewares run in the order they are added.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends a parser; parsers run in the order they are added.
    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    pub fn build(self, state: State) -> Router<State> {
        self.build_with_shared_state(Arc::new(state))
    }

    pub fn build_with_shared_state(self, state: Arc<State>) -> Router<State> {
        tracing::debug!(
            routes = self.routes.len(),
            middlewares = self.middlewares.len(),
            parsers = self.parsers.len(),
            "router built"
        );
        Router {
            routes: RouteTable::new(self.routes),
            middlewares: self.middlewares,
            parsers: self.parsers,
            state,
        }
    }

    /// Seeds a builder with the routes registered through the `#[route]`
    /// attribute for this state type, in registration order.
    pub fn from_registry() -> Self {
        let mut builder = Self::new();

        let entries = {
            let registry = ROUTE_REGISTRY
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            registry
                .get(&TypeId::of::<State>())
                .and_then(|entries| entries.downcast_ref::<Vec<RegistryEntry<State>>>())
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| {
                            (entry.method, entry.path, entry.options, Arc::clone(&entry.handler))
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        };

        for (method, path, options, handler) in entries {
            builder
                .routes
                .push(Route::new(method, path, handler, options));
        }

        builder
    }
}

impl<State> Default for RouterBuilder<State>
where
    State: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

struct RegistryEntry<State> {
    method: &'static str,
    path: &'static str,
    options: RouteOptions,
    handler: Arc<BoxedHandler<State>>,
}

/// Adds a route to the global registry read by [`RouterBuilder::from_registry`].
///
/// Called by the code the `#[route]` attribute generates; it runs before
/// `main`, so registration is complete before any router is built.
pub fn register_route<State>(
    method: &'static str,
    path: &'static str,
    auth: bool,
    handler: impl Fn(RouteContext<State>) -> HandlerFuture + Send + Sync + 'static,
) where
    State: Send + Sync + 'static,
{
    let handler: Arc<BoxedHandler<State>> = Arc::new(handler);
    let entry = RegistryEntry {
        method,
        path,
        options: RouteOptions { auth },
        handler,
    };

    let mut registry = ROUTE_REGISTRY
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let entries = registry
        .entry(TypeId::of::<State>())
        .or_insert_with(|| Box::new(Vec::<RegistryEntry<State>>::new()));

    if let Some(entries) = entries.downcast_mut::<Vec<RegistryEntry<State>>>() {
        entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RegistryState;

    #[tokio::test]
    async fn test_from_registry_keeps_registration_order() {
        register_route::<RegistryState>("GET", "/registered/:id", false, |ctx| {
            Box::pin(async move {
                Ok::<_, Error>(NormalizedResult::new(200).with_body(ctx.get_param_or_empty("id")))
            })
        });
        register_route::<RegistryState>("get", "/registered/fixed", true, |_| {
            Box::pin(async { Ok::<_, Error>(NormalizedResult::new(201)) })
        });

        let router = RouterBuilder::<RegistryState>::from_registry().build(RegistryState);

        assert_eq!(router.routes().len(), 2);
        assert_eq!(router.routes()[0].pattern(), "/registered/:id");
        assert_eq!(router.routes()[1].method(), "GET");
        assert!(router.routes()[1].requires_auth());

        let result = router
            .call(NormalizedEvent::new("GET", "/registered/fixed"))
            .await;
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body.as_deref(), Some("fixed"));
    }

    #[test]
    fn test_registry_is_keyed_by_state_type() {
        struct OtherState;
        assert!(RouterBuilder::<OtherState>::from_registry().routes.is_empty());
    }
}
