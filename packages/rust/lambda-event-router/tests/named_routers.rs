use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use aws_lambda_events::http::Method;
use lambda_event_router::{define_router, route, Error, NormalizedEvent, NormalizedResult};
use lambda_runtime::LambdaEvent;
use serde_json::json;

struct PublicState;

struct AdminState {
    admin: String,
}

define_router!(module = public_router, state = PublicState);
define_router!(module = admin_router, state = AdminState);

#[route(path = "/health", module = "public_router")]
async fn health(_ctx: public_router::RouteContext) -> Result<NormalizedResult, Error> {
    Ok(NormalizedResult::json(200, &json!({ "message": "Health!" })))
}

#[route(path = "/whoami", module = "admin_router")]
async fn whoami(ctx: admin_router::RouteContext) -> Result<NormalizedResult, Error> {
    Ok(NormalizedResult::json(200, &json!({ "admin": ctx.state().admin })))
}

#[tokio::test]
async fn test_routes_are_kept_per_router() {
    let public = public_router::RouterBuilder::from_registry().build(PublicState);
    let admin = admin_router::RouterBuilder::from_registry().build(AdminState {
        admin: "root".to_string(),
    });

    assert_eq!(public.routes().len(), 1);
    assert_eq!(admin.routes().len(), 1);

    let health = NormalizedEvent::new("GET", "/health");
    assert_eq!(public.call(health.clone()).await.status_code, 200);
    assert_eq!(admin.call(health).await.status_code, 404);

    let whoami = admin.call(NormalizedEvent::new("GET", "/whoami")).await;
    assert_eq!(whoami.body.as_deref(), Some(r#"{"admin":"root"}"#));
}

#[tokio::test]
async fn test_lambda_payload_is_routed() {
    let router = public_router::RouterBuilder::from_registry().build(PublicState);

    let mut request = ApiGatewayV2httpRequest::default();
    request.raw_path = Some("/live/health/".to_string());
    request.request_context.stage = Some("live".to_string());
    request.request_context.http.method = Method::GET;

    let result = router
        .handle_request(LambdaEvent::new(request, lambda_runtime::Context::default()))
        .await
        .unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.body.as_deref(), Some(r#"{"message":"Health!"}"#));
}
