//! Middleware support for request pre-processing.
//!
//! Middlewares run in registration order after a route has matched and before
//! its handler. Each one sees the event produced by the previous one and
//! decides whether dispatch continues, continues with a replacement event, or
//! stops with a result.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::{Error, NormalizedEvent, NormalizedResult};

/// What a middleware wants the dispatcher to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum MiddlewareAction {
    /// Keep the current event and run the next step
    Continue,
    /// Use this event for every later middleware and for the handler
    Replace(NormalizedEvent),
    /// Stop here: skip the remaining middlewares and the handler
    Respond(NormalizedResult),
}

/// A unit of request pre-processing.
///
/// Returning an `Err` aborts the chain; the dispatcher turns the error into a
/// result the same way it does for handler failures.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use lambda_event_router_core::{
///     Error, Middleware, MiddlewareAction, NormalizedEvent, NormalizedResult,
/// };
///
/// struct RequireApiKey;
///
/// #[async_trait]
/// impl Middleware for RequireApiKey {
///     async fn handle(&self, event: &NormalizedEvent) -> Result<MiddlewareAction, Error> {
///         match event.header("x-api-key") {
///             Some(_) => Ok(MiddlewareAction::Continue),
///             None => Ok(MiddlewareAction::Respond(NormalizedResult::message(
///                 403,
///                 "Missing API key.",
///             ))),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, event: &NormalizedEvent) -> Result<MiddlewareAction, Error>;
}

/// A middleware built from an async closure. See [`from_fn`].
#[derive(Clone)]
pub struct MiddlewareFn<F> {
    f: F,
}

/// Creates a middleware from an async function taking the current event.
///
/// The closure receives its own copy of the event, so it can rewrite it and
/// hand it back with [`MiddlewareAction::Replace`].
///
/// ```rust
/// use lambda_event_router_core::{from_fn, MiddlewareAction};
///
/// let tag_request = from_fn(|mut event| async move {
///     event.headers.insert("x-tagged".to_string(), "true".to_string());
///     Ok(MiddlewareAction::Replace(event))
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> MiddlewareFn<F>
where
    F: Fn(NormalizedEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MiddlewareAction, Error>> + Send + 'static,
{
    MiddlewareFn { f }
}

#[async_trait]
impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(NormalizedEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MiddlewareAction, Error>> + Send + 'static,
{
    async fn handle(&self, event: &NormalizedEvent) -> Result<MiddlewareAction, Error> {
        (self.f)(event.clone()).await
    }
}

/// Where the middleware chain left the request.
#[derive(Debug)]
pub(crate) enum ChainOutcome {
    /// Every middleware let the request through; the handler gets this event
    Proceed(NormalizedEvent),
    /// A middleware answered the request itself
    ShortCircuit(NormalizedResult),
}

/// Runs the middlewares strictly in order, each awaited before the next.
pub(crate) async fn run_chain(
    middlewares: &[Arc<dyn Middleware>],
    event: NormalizedEvent,
) -> Result<ChainOutcome, Error> {
    let mut current = event;
    for (index, middleware) in middlewares.iter().enumerate() {
        match middleware.handle(&current).await? {
            MiddlewareAction::Continue => {}
            MiddlewareAction::Replace(next) => current = next,
            MiddlewareAction::Respond(result) => {
                tracing::debug!(
                    middleware = index,
                    status_code = result.status_code,
                    "middleware short-circuited request"
                );
                return Ok(ChainOutcome::ShortCircuit(result));
            }
        }
    }
    Ok(ChainOutcome::Proceed(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: Arc<AtomicUsize>, action: MiddlewareAction) -> Arc<dyn Middleware> {
        Arc::new(from_fn(move |_| {
            let counter = Arc::clone(&counter);
            let action = action.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(action)
            }
        }))
    }

    #[tokio::test]
    async fn test_empty_chain_proceeds_with_same_event() {
        let event = NormalizedEvent::new("GET", "/teste");

        match run_chain(&[], event.clone()).await.unwrap() {
            ChainOutcome::Proceed(out) => assert_eq!(out, event),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_short_circuit_stops_later_middlewares() {
        let first = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            counting(first.clone(), MiddlewareAction::Continue),
            counting(
                Arc::new(AtomicUsize::new(0)),
                MiddlewareAction::Respond(NormalizedResult::new(429)),
            ),
            counting(last.clone(), MiddlewareAction::Continue),
        ];

        let outcome = run_chain(&chain, NormalizedEvent::default()).await.unwrap();

        match outcome {
            ChainOutcome::ShortCircuit(result) => assert_eq!(result.status_code, 429),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_replacement_is_seen_by_later_middlewares() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(from_fn(|event| async move {
                Ok(MiddlewareAction::Replace(event.with_header("x-step", "one")))
            })),
            Arc::new(from_fn(|event| async move {
                let seen = event.header("x-step").unwrap_or("missing").to_string();
                Ok(MiddlewareAction::Replace(event.with_header("x-seen", seen)))
            })),
            Arc::new(from_fn(|_| async move { Ok(MiddlewareAction::Continue) })),
        ];

        let original = NormalizedEvent::new("GET", "/teste");
        let outcome = run_chain(&chain, original.clone()).await.unwrap();

        match outcome {
            ChainOutcome::Proceed(event) => {
                assert_eq!(event.header("x-seen"), Some("one"));
                assert_ne!(event, original);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(original.headers.is_empty());
    }

    #[tokio::test]
    async fn test_error_aborts_chain() {
        let after = Arc::new(AtomicUsize::new(0));
        let chain = vec![
            Arc::new(from_fn(|_| async move { Err::<MiddlewareAction, Error>("boom".into()) }))
                as Arc<dyn Middleware>,
            counting(after.clone(), MiddlewareAction::Continue),
        ];

        let outcome = run_chain(&chain, NormalizedEvent::default()).await;

        assert_eq!(outcome.unwrap_err().to_string(), "boom");
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }
}
