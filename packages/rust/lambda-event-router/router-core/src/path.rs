//! Path pattern matching.
//!
//! Patterns are split on `/` with empty segments discarded, so leading,
//! trailing and repeated slashes never matter. A segment starting with `:`
//! captures exactly one concrete segment; every other segment is a literal
//! that must match exactly (case-sensitive).

use std::collections::HashMap;

use crate::constants::DEFAULT_STAGE;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A route pattern split into segments once, at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub(crate) fn parse(pattern: &str) -> Self {
        let segments = segments(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    pub(crate) fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let concrete: Vec<&str> = segments(path).collect();
        if concrete.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, value) in self.segments.iter().zip(concrete) {
            match segment {
                Segment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
            }
        }
        Some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Matches a concrete path against a pattern such as `/items/:id`.
///
/// Returns the captured parameters (empty when the pattern has none), or
/// `None` when the path does not match.
///
/// ```rust
/// use lambda_event_router_core::match_path;
///
/// let params = match_path("/users/:id/posts/:post_id", "/users/123/posts/456").unwrap();
/// assert_eq!(params["id"], "123");
/// assert_eq!(params["post_id"], "456");
///
/// assert!(match_path("/users/:id", "/users/123/posts").is_none());
/// ```
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    PathPattern::parse(pattern).matches(path)
}

/// Produces the path used for route selection.
///
/// A single trailing `/` is dropped (a bare `/` is kept), then, unless the
/// stage is `$default`, the first occurrence of the stage token is removed.
pub fn normalize_path(path: &str, stage: &str) -> String {
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };

    if stage == DEFAULT_STAGE {
        path.to_string()
    } else {
        path.replacen(stage, "", 1)
    }
}
