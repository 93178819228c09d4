//! Failure types and their translation into results.
//!
//! Handlers and middlewares fail with the boxed [`Error`] used by
//! `lambda_runtime`. The dispatcher recovers an [`HttpError`] from it by
//! downcasting; every other failure becomes a generic 500 whose detail is
//! only logged.

use std::any::Any;
use thiserror::Error as ThisError;

use crate::constants::{messages, status};
use crate::event::NormalizedResult;

/// Boxed error returned by handlers, middlewares and counter stores.
pub type Error = lambda_runtime::Error;

/// A failure carrying an explicit HTTP status code and message.
///
/// Returning this from a handler or middleware produces a result with the
/// same status and a `{"message": ...}` body.
///
/// # Examples
///
/// ```rust
/// use lambda_event_router_core::{Error, HttpError, NormalizedResult};
///
/// fn lookup(id: &str) -> Result<NormalizedResult, Error> {
///     if id != "42" {
///         return Err(HttpError::not_found(format!("No item {}", id)).into());
///     }
///     Ok(NormalizedResult::new(200))
/// }
///
/// assert!(lookup("7").is_err());
/// ```
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("HTTP {status_code}: {message}")]
pub struct HttpError {
    pub status_code: u16,
    pub message: String,
}

impl HttpError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(status::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(status::FORBIDDEN, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(status::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(status::INTERNAL_SERVER_ERROR, message)
    }

    /// Converts the error into the result sent back to the caller.
    pub fn to_result(&self) -> NormalizedResult {
        NormalizedResult::message(self.status_code, &self.message)
    }
}

impl Default for HttpError {
    fn default() -> Self {
        Self::internal(messages::UNKNOWN_ERROR)
    }
}

impl From<HttpError> for NormalizedResult {
    fn from(error: HttpError) -> Self {
        error.to_result()
    }
}

/// A panic caught while a middleware or handler was running.
#[derive(ThisError, Debug)]
#[error("panicked: {0}")]
pub(crate) struct Panicked(pub(crate) String);

impl Panicked {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self(message)
    }
}

/// Translates any failure into a result. Never fails.
pub(crate) fn failure_result(error: &Error) -> NormalizedResult {
    match error.downcast_ref::<HttpError>() {
        Some(http_error) => {
            tracing::warn!(
                status_code = http_error.status_code,
                message = %http_error.message,
                "request failed with http error"
            );
            http_error.to_result()
        }
        None => {
            tracing::error!(error = %error, "unhandled error while dispatching request");
            NormalizedResult::message(status::INTERNAL_SERVER_ERROR, messages::INTERNAL_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn body_json(result: &NormalizedResult) -> Value {
        serde_json::from_str(result.body.as_deref().unwrap_or("null")).unwrap()
    }

    #[test]
    fn test_http_error_translated_verbatim() {
        let error: Error = HttpError::too_many_requests("rate limited").into();
        let result = failure_result(&error);

        assert_eq!(result.status_code, 429);
        assert_eq!(body_json(&result), json!({ "message": "rate limited" }));
    }

    #[test]
    fn test_unstructured_error_hides_detail() {
        let error: Error = "database password is hunter2".into();
        let result = failure_result(&error);

        assert_eq!(result.status_code, 500);
        assert_eq!(body_json(&result), json!({ "message": "Internal error." }));
    }

    #[test]
    fn test_default_http_error() {
        let error = HttpError::default();
        assert_eq!(error.status_code, 500);
        assert_eq!(error.message, "Unknown internal server error!");
        assert_eq!(error.to_string(), "HTTP 500: Unknown internal server error!");
    }

    #[test]
    fn test_panic_payloads() {
        assert_eq!(Panicked::from_payload(Box::new("boom")).0, "boom");
        assert_eq!(
            Panicked::from_payload(Box::new(String::from("kaboom"))).0,
            "kaboom"
        );
        assert_eq!(
            Panicked::from_payload(Box::new(7_u8)).0,
            "unknown panic payload"
        );
    }
}
