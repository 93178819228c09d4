use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::constants::{messages, status};
use crate::{Error, Middleware, MiddlewareAction, NormalizedEvent, NormalizedResult};

/// Parses the request body as JSON into [`NormalizedEvent::json_body`].
///
/// Requests without a body pass through untouched. A body that is not valid
/// JSON stops the request with a 500 and a `Malformed JSON body.` message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody;

impl JsonBody {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for JsonBody {
    async fn handle(&self, event: &NormalizedEvent) -> Result<MiddlewareAction, Error> {
        let body = match event.body.as_deref() {
            Some(body) if !body.is_empty() => body,
            _ => return Ok(MiddlewareAction::Continue),
        };

        match serde_json::from_str::<JsonValue>(body) {
            Ok(json_body) => Ok(MiddlewareAction::Replace(NormalizedEvent {
                json_body: Some(json_body),
                ..event.clone()
            })),
            Err(e) => {
                tracing::warn!(error = %e, "request body is not valid JSON");
                Ok(MiddlewareAction::Respond(NormalizedResult::message(
                    status::INTERNAL_SERVER_ERROR,
                    messages::MALFORMED_JSON,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_or_empty_body_passes_through() {
        let middleware = JsonBody::new();

        let no_body = NormalizedEvent::new("DELETE", "/teste");
        assert_eq!(
            middleware.handle(&no_body).await.unwrap(),
            MiddlewareAction::Continue
        );

        let empty_body = NormalizedEvent::new("DELETE", "/teste").with_body("");
        assert_eq!(
            middleware.handle(&empty_body).await.unwrap(),
            MiddlewareAction::Continue
        );
    }

    #[tokio::test]
    async fn test_valid_body_is_parsed_into_new_event() {
        let event = NormalizedEvent::new("POST", "/teste").with_body(r#"{"name":"widget","qty":2}"#);

        let action = JsonBody::new().handle(&event).await.unwrap();

        match action {
            MiddlewareAction::Replace(next) => {
                assert_eq!(next.json_body, Some(json!({ "name": "widget", "qty": 2 })));
                assert_eq!(next.body, event.body);
            }
            other => panic!("expected a replacement event, got {:?}", other),
        }
        assert!(event.json_body.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_short_circuits() {
        let event = NormalizedEvent::new("POST", "/teste").with_body("{not json");

        let action = JsonBody::new().handle(&event).await.unwrap();

        match action {
            MiddlewareAction::Respond(result) => {
                assert_eq!(result.status_code, 500);
                assert_eq!(
                    result.body.as_deref(),
                    Some(r#"{"message":"Malformed JSON body."}"#)
                );
            }
            other => panic!("expected a 500, got {:?}", other),
        }
    }
}
