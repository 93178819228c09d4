use async_trait::async_trait;
use bon::bon;
use std::env;

use crate::constants::{defaults, env_vars, messages, status};
use crate::counter_store::{now_millis, CounterStore};
use crate::{Error, Middleware, MiddlewareAction, NormalizedEvent, NormalizedResult};

/// Request rates derived from the time since the previous request.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rates {
    per_second: f64,
    per_minute: f64,
}

impl Rates {
    // A zero delta (first request, or same millisecond) counts as no rate at all
    fn between(last_seen: i64, now: i64) -> Self {
        let delta_ms = (now - last_seen) as f64;
        if delta_ms == 0.0 {
            return Self {
                per_second: 0.0,
                per_minute: 0.0,
            };
        }
        Self {
            per_second: 1_000.0 / delta_ms,
            per_minute: 60_000.0 / delta_ms,
        }
    }
}

fn enabled(limit: Option<f64>) -> Option<f64> {
    limit.filter(|limit| *limit > 0.0)
}

/// Rejects requests from a source IP arriving faster than the configured rates.
///
/// The rate is estimated from the gap between the current request and the
/// previous one from the same source IP, as reported by the counter store.
/// Either limit may be left unset; unset limits fall back to the
/// `ROUTER_RATE_LIMIT_RPM` / `ROUTER_RATE_LIMIT_RPS` environment variables.
/// A limit of zero or less disables that check.
///
/// # Examples
///
/// ```rust
/// use lambda_event_router_core::{InMemoryCounterStore, RateLimiter, Router};
///
/// let limiter = RateLimiter::builder()
///     .store(InMemoryCounterStore::new())
///     .rpm(20.0)
///     .build();
///
/// let router = Router::<()>::builder().middleware(limiter).build(());
/// ```
pub struct RateLimiter<S> {
    store: S,
    rpm: Option<f64>,
    rps: Option<f64>,
    log_rates: bool,
    clock: fn() -> i64,
}

#[bon]
impl<S> RateLimiter<S>
where
    S: CounterStore,
{
    fn env_limit(name: &str) -> Option<f64> {
        env::var(name).ok().and_then(|s| s.trim().parse().ok())
    }

    fn default_log_rates() -> bool {
        env::var(env_vars::RATE_LIMIT_LOG)
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults::RATE_LIMIT_LOG)
    }

    /// Creates a new RateLimiter with the given store and configuration
    #[builder]
    pub fn new(
        store: S,
        rpm: Option<f64>,
        rps: Option<f64>,
        log_rates: Option<bool>,
        clock: Option<fn() -> i64>,
    ) -> Self {
        Self {
            store,
            rpm: enabled(rpm.or_else(|| Self::env_limit(env_vars::RATE_LIMIT_RPM))),
            rps: enabled(rps.or_else(|| Self::env_limit(env_vars::RATE_LIMIT_RPS))),
            log_rates: log_rates.unwrap_or_else(Self::default_log_rates),
            clock: clock.unwrap_or(now_millis),
        }
    }
}

impl<S> RateLimiter<S> {
    pub fn rpm(&self) -> Option<f64> {
        self.rpm
    }

    pub fn rps(&self) -> Option<f64> {
        self.rps
    }

    fn exceeded(&self, rates: Rates) -> bool {
        let over = |limit: Option<f64>, rate: f64| limit.is_some_and(|limit| rate >= limit);
        over(self.rpm, rates.per_minute) || over(self.rps, rates.per_second)
    }
}

#[async_trait]
impl<S> Middleware for RateLimiter<S>
where
    S: CounterStore,
{
    async fn handle(&self, event: &NormalizedEvent) -> Result<MiddlewareAction, Error> {
        let key = event.source_ip.as_str();
        let now = (self.clock)();
        let last_seen = self.store.get(key).await?;
        let rates = Rates::between(last_seen, now);

        if self.log_rates {
            tracing::info!(
                source_ip = key,
                delta_ms = now - last_seen,
                rps = rates.per_second,
                rpm = rates.per_minute,
                "rate limiter"
            );
        }

        if self.exceeded(rates) {
            tracing::warn!(source_ip = key, "rate limit exceeded");
            return Ok(MiddlewareAction::Respond(NormalizedResult::message(
                status::TOO_MANY_REQUESTS,
                messages::TOO_MANY_REQUESTS,
            )));
        }

        Ok(MiddlewareAction::Continue)
    }
}
