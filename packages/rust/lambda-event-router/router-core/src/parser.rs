//! Response post-processing.
//!
//! Parsers run on every result that leaves the router, including not-found
//! and failure results, folded left to right in registration order.

use std::sync::Arc;

use crate::NormalizedResult;

/// A pure, total transformation of a result.
///
/// Implemented for every `Fn(NormalizedResult) -> NormalizedResult`, so plain
/// functions and closures can be registered directly.
pub trait Parser: Send + Sync {
    fn parse(&self, result: NormalizedResult) -> NormalizedResult;
}

impl<F> Parser for F
where
    F: Fn(NormalizedResult) -> NormalizedResult + Send + Sync,
{
    fn parse(&self, result: NormalizedResult) -> NormalizedResult {
        self(result)
    }
}

/// Stamps `Content-Type: application/json`, keeping every other header.
pub fn add_content_type_json(result: NormalizedResult) -> NormalizedResult {
    result.with_header("Content-Type", "application/json")
}

pub(crate) fn apply_parsers(
    parsers: &[Arc<dyn Parser>],
    result: NormalizedResult,
) -> NormalizedResult {
    parsers
        .iter()
        .fold(result, |result, parser| parser.parse(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_parsers_is_identity() {
        let result = NormalizedResult::new(204).with_header("x-a", "1");
        assert_eq!(apply_parsers(&[], result.clone()), result);
    }

    #[test]
    fn test_parsers_compose_left_to_right() {
        let append_a: Arc<dyn Parser> = Arc::new(|r: NormalizedResult| {
            let body = r.body.clone().unwrap_or_default();
            r.with_body(format!("{}A", body))
        });
        let append_b: Arc<dyn Parser> = Arc::new(|r: NormalizedResult| {
            let body = r.body.clone().unwrap_or_default();
            r.with_body(format!("{}B", body))
        });

        let result = apply_parsers(&[append_a.clone(), append_b.clone()], NormalizedResult::new(200));
        assert_eq!(result.body.as_deref(), Some("AB"));

        let expected = append_b.parse(append_a.parse(NormalizedResult::new(200)));
        assert_eq!(result, expected);
    }

    #[test]
    fn test_add_content_type_json_keeps_other_headers() {
        let result = add_content_type_json(
            NormalizedResult::new(200)
                .with_header("x-request-id", "abc")
                .with_body("{}"),
        );

        assert_eq!(result.headers["Content-Type"], "application/json");
        assert_eq!(result.headers["x-request-id"], "abc");
        assert_eq!(result.body.as_deref(), Some("{}"));
    }
}
