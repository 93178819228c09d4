//! A Lambda function answering `POST /teste` behind API Gateway HTTP API.
//!
//! Requests are logged, tagged, rate limited to 20 per minute per source IP and
//! their JSON bodies parsed before reaching the handler.

use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use lambda_event_router::constants::status;
use lambda_event_router::{
    add_content_type_json, from_fn, Error, InMemoryCounterStore, JsonBody, MiddlewareAction,
    NormalizedResult, RateLimiter, Router,
};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

fn build_router() -> Router<()> {
    let log_request = from_fn(|event| async move {
        tracing::info!(
            method = %event.method,
            path = %event.path,
            source_ip = %event.source_ip,
            "incoming request"
        );
        Ok(MiddlewareAction::Continue)
    });

    let tag_body = from_fn(|mut event| async move {
        let Some(body) = event.body.as_deref() else {
            return Ok(MiddlewareAction::Continue);
        };
        let mut body: Value = serde_json::from_str(body)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("test".to_string(), json!("new value"));
        }
        event.body = Some(body.to_string());
        Ok::<_, Error>(MiddlewareAction::Replace(event))
    });

    let rate_limiter = RateLimiter::builder()
        .store(InMemoryCounterStore::new().with_retention(60_000))
        .rpm(20.0)
        .build();

    Router::builder()
        .middleware(log_request)
        .middleware(tag_body)
        .middleware(rate_limiter)
        .middleware(JsonBody::new())
        .parser(add_content_type_json)
        .post("/teste", |ctx| async move {
            tracing::info!(body = ?ctx.event.json_body, "health check");
            Ok(NormalizedResult::json(status::OK, &json!({ "message": "Health!" })))
        })
        .build(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let env_var_name = if env::var("RUST_LOG").is_ok() {
        "RUST_LOG"
    } else {
        "AWS_LAMBDA_LOG_LEVEL"
    };
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_env_var(env_var_name)
        .from_env_lossy();
    let subscriber = tracing_subscriber::registry::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_ansi(false),
        );
    tracing::subscriber::set_global_default(subscriber)?;

    let router = Arc::new(build_router());

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| {
        let router = Arc::clone(&router);
        async move { router.handle_request(event).await }
    }))
    .await
}
