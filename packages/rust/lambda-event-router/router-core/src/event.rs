use aws_lambda_events::{
    alb::AlbTargetGroupRequest,
    apigw::{ApiGatewayProxyRequest, ApiGatewayV2httpRequest},
    http::HeaderMap,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

use crate::constants::DEFAULT_STAGE;

fn default_stage() -> String {
    DEFAULT_STAGE.to_string()
}

/// The normalized representation of one inbound HTTP request.
///
/// The router never mutates an event in place. Middlewares that want to change
/// it return a new value, and the matched path parameters are merged into a
/// fresh copy before the middleware chain runs.
///
/// Events can be built from the AWS Lambda HTTP event types through `From`,
/// or by hand:
///
/// ```rust
/// use lambda_event_router_core::NormalizedEvent;
///
/// let event = NormalizedEvent::new("POST", "/prod/items/")
///     .with_stage("prod")
///     .with_header("content-type", "application/json")
///     .with_body(r#"{"name":"widget"}"#)
///     .with_source_ip("203.0.113.7");
///
/// assert_eq!(event.header("Content-Type"), Some("application/json"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub method: String,
    pub path: String,
    /// Deployment stage; `$default` means the path has no stage prefix
    #[serde(default = "default_stage")]
    pub stage: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query_params: HashMap<String, String>,
    /// Filled by the router from the matched route pattern
    #[serde(default)]
    pub path_params: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub source_ip: String,
    /// Parsed body, set by the `JsonBody` middleware
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_body: Option<JsonValue>,
}

impl NormalizedEvent {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            stage: default_stage(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            path_params: HashMap::new(),
            body: None,
            source_ip: String::new(),
            json_body: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = source_ip.into();
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl Default for NormalizedEvent {
    fn default() -> Self {
        Self::new("GET", "/")
    }
}

/// The normalized representation of one outbound HTTP response.
///
/// Serializes to the `{"statusCode", "headers", "body"}` shape Lambda HTTP
/// integrations expect, so it can be returned from a Lambda handler as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl NormalizedResult {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// A result whose body is the serialized JSON value.
    pub fn json(status_code: u16, body: &JsonValue) -> Self {
        Self::new(status_code).with_body(body.to_string())
    }

    /// A result with a `{"message": ...}` body, the shape used for errors.
    pub fn message(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &json!({ "message": message }))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

fn header_map_to_hash_map(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            // Repeated headers are joined the way proxies fold them
            map.entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }
    map
}

fn decode_body(body: Option<String>, is_base64_encoded: bool) -> Option<String> {
    let body = body?;
    if !is_base64_encoded {
        return Some(body);
    }
    match STANDARD
        .decode(body.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(decoded) => Some(decoded),
        None => {
            tracing::debug!("keeping base64 body that does not decode to utf-8");
            Some(body)
        }
    }
}

impl From<ApiGatewayV2httpRequest> for NormalizedEvent {
    fn from(request: ApiGatewayV2httpRequest) -> Self {
        let http = request.request_context.http;
        let path = request
            .raw_path
            .or(http.path)
            .unwrap_or_else(|| "/".to_string());
        let query_params = request
            .query_string_parameters
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            method: http.method.to_string(),
            path,
            stage: request.request_context.stage.unwrap_or_else(default_stage),
            headers: header_map_to_hash_map(&request.headers),
            query_params,
            path_params: HashMap::new(),
            body: decode_body(request.body, request.is_base64_encoded),
            source_ip: http.source_ip.unwrap_or_default(),
            json_body: None,
        }
    }
}

impl From<ApiGatewayProxyRequest> for NormalizedEvent {
    fn from(request: ApiGatewayProxyRequest) -> Self {
        let query_params = request
            .query_string_parameters
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        // REST API paths are already relative to the stage
        Self {
            method: request.http_method.to_string(),
            path: request.path.unwrap_or_else(|| "/".to_string()),
            stage: default_stage(),
            headers: header_map_to_hash_map(&request.headers),
            query_params,
            path_params: HashMap::new(),
            body: decode_body(request.body, request.is_base64_encoded),
            source_ip: request
                .request_context
                .identity
                .source_ip
                .unwrap_or_default(),
            json_body: None,
        }
    }
}

impl From<AlbTargetGroupRequest> for NormalizedEvent {
    fn from(request: AlbTargetGroupRequest) -> Self {
        let query_params = request
            .query_string_parameters
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        // ALB puts the original client IP first
        let source_ip = request
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|ips| ips.split(',').next())
            .map(|ip| ip.trim().to_string())
            .unwrap_or_default();

        Self {
            method: request.http_method.to_string(),
            path: request.path.unwrap_or_else(|| "/".to_string()),
            stage: default_stage(),
            headers: header_map_to_hash_map(&request.headers),
            query_params,
            path_params: HashMap::new(),
            body: decode_body(request.body, request.is_base64_encoded),
            source_ip,
            json_body: None,
        }
    }
}
