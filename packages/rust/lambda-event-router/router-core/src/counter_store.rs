//! Last-seen timestamps backing the rate limiter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::Error;

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Storage consulted by [`RateLimiter`](crate::RateLimiter).
///
/// `get` returns the timestamp (milliseconds since the Unix epoch) of the
/// previous request seen for `key`. Implementations sharing state between
/// concurrent requests are responsible for their own synchronization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<i64, Error>;
}

/// Process-local store: returns the previous timestamp for a key, or the
/// current time the first time the key is seen, and records the current time.
///
/// One entry is kept per key. Without a retention window the map grows with
/// every new source IP for the life of the process; use
/// [`with_retention`](Self::with_retention) to drop keys not seen recently.
pub struct InMemoryCounterStore {
    last_seen: Mutex<HashMap<String, i64>>,
    clock: fn() -> i64,
    retention_ms: Option<i64>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::with_clock(now_millis)
    }

    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            last_seen: Mutex::new(HashMap::new()),
            clock,
            retention_ms: None,
        }
    }

    /// Forgets keys whose last request is older than `retention_ms`. A
    /// forgotten key is treated as seen for the first time.
    pub fn with_retention(mut self, retention_ms: i64) -> Self {
        self.retention_ms = Some(retention_ms);
        self
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn get(&self, key: &str) -> Result<i64, Error> {
        let now = (self.clock)();
        let mut last_seen = self
            .last_seen
            .lock()
            .map_err(|_| "counter store lock poisoned")?;
        if let Some(retention_ms) = self.retention_ms {
            last_seen.retain(|_, seen| now - *seen <= retention_ms);
        }
        let previous = last_seen.insert(key.to_string(), now);
        Ok(previous.unwrap_or(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    static TICK: AtomicI64 = AtomicI64::new(1_000);

    fn ticking_clock() -> i64 {
        TICK.fetch_add(250, Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_first_sight_returns_now_then_previous() {
        let store = InMemoryCounterStore::with_clock(ticking_clock);

        let first = store.get("10.0.0.1").await.unwrap();
        let second = store.get("10.0.0.1").await.unwrap();

        assert_eq!(second, first);
        let third = store.get("10.0.0.1").await.unwrap();
        assert_eq!(third, first + 250);
    }

    static RETENTION_TICK: AtomicI64 = AtomicI64::new(0);

    fn slow_clock() -> i64 {
        RETENTION_TICK.fetch_add(1_000, Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_retention_evicts_stale_keys() {
        let store = InMemoryCounterStore::with_clock(slow_clock).with_retention(1_500);

        let first = store.get("10.0.0.1").await.unwrap();
        store.get("10.0.0.2").await.unwrap();
        store.get("10.0.0.3").await.unwrap();

        // 10.0.0.1 was last seen 3s ago and has been forgotten
        let again = store.get("10.0.0.1").await.unwrap();
        assert_ne!(again, first);
        assert_eq!(store.last_seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_without_retention_keys_accumulate() {
        let store = InMemoryCounterStore::with_clock(|| 7);
        for ip in ["a", "b", "c"] {
            store.get(ip).await.unwrap();
        }
        assert_eq!(store.last_seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = InMemoryCounterStore::with_clock(|| 42);

        assert_eq!(store.get("a").await.unwrap(), 42);
        assert_eq!(store.get("b").await.unwrap(), 42);
    }
}
