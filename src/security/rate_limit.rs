//! Distributed fixed-window rate limiting middleware.
//!
//! The window counter lives in the external counter store under
//! `rate_limit:<client-ip>`; this process keeps no per-client state, so any
//! number of gateway instances share one quota per client address.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreFailurePolicy;
use crate::http::response::reject;
use crate::observability::metrics;
use crate::store::CounterStore;

const KEY_PREFIX: &str = "rate_limit:";

/// Outcome of a window check for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Within the limit for the current window.
    Allowed,

    /// Past the limit; the increment has already been recorded.
    Limited,

    /// Store unreachable under the `deny` failure policy.
    Unavailable,
}

/// Fixed-window rate limiter over an external atomic counter.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    window: Duration,
    max_requests: u64,
    on_store_error: StoreFailurePolicy,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        window: Duration,
        max_requests: u64,
        on_store_error: StoreFailurePolicy,
    ) -> Self {
        Self {
            store,
            window,
            max_requests,
            on_store_error,
        }
    }

    /// Record one request from `client` and decide whether it fits the
    /// current window.
    ///
    /// The counter is incremented before the comparison and never rolled
    /// back: it counts requests seen, not requests admitted, so it keeps
    /// growing past the limit within a window.
    pub async fn check(&self, client: IpAddr) -> RateLimitDecision {
        let key = format!("{KEY_PREFIX}{client}");

        let count = match self.store.increment(&key).await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(client = %client, error = %e, "Counter store error");
                return match self.on_store_error {
                    StoreFailurePolicy::Allow => RateLimitDecision::Allowed,
                    StoreFailurePolicy::Deny => RateLimitDecision::Unavailable,
                };
            }
        };

        // A count of 1 means the store just created the counter; it gets
        // the window TTL exactly once per window.
        if count == 1 {
            if let Err(e) = self.store.set_expiry(&key, self.window).await {
                tracing::error!(client = %client, error = %e, "Failed to set window expiry");
            }
        }

        if count > self.max_requests {
            RateLimitDecision::Limited
        } else {
            RateLimitDecision::Allowed
        }
    }
}

/// Middleware enforcing the per-client window.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check(addr.ip()).await {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited => {
            tracing::info!(client = %addr.ip(), "Rate limit exceeded");
            metrics::record_rejected("rate_limited");
            reject(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests")
        }
        RateLimitDecision::Unavailable => {
            metrics::record_rejected("store_unavailable");
            reject(StatusCode::SERVICE_UNAVAILABLE, "Rate limiter unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        counters: Mutex<HashMap<String, u64>>,
        expiry_calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CounterStore for MapStore {
        async fn increment(&self, key: &str) -> Result<u64, StoreError> {
            if self.fail {
                return Err(StoreError::Unreachable("store down".into()));
            }
            let mut counters = self.counters.lock().unwrap();
            let count = counters.entry(key.to_string()).or_insert(0);
            *count += 1;
            Ok(*count)
        }

        async fn set_expiry(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unreachable("store down".into()));
            }
            self.expiry_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn limiter(store: Arc<MapStore>, max: u64, policy: StoreFailurePolicy) -> RateLimiter {
        RateLimiter::new(store, Duration::from_secs(60), max, policy)
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn allows_up_to_max_then_limits() {
        let store = Arc::new(MapStore::default());
        let limiter = limiter(store.clone(), 3, StoreFailurePolicy::Allow);

        for _ in 0..3 {
            assert_eq!(limiter.check(ip("10.0.0.1")).await, RateLimitDecision::Allowed);
        }
        assert_eq!(limiter.check(ip("10.0.0.1")).await, RateLimitDecision::Limited);
        assert_eq!(limiter.check(ip("10.0.0.1")).await, RateLimitDecision::Limited);

        // rejected requests still count: the counter grows past the limit
        let counters = store.counters.lock().unwrap();
        assert_eq!(counters.get("rate_limit:10.0.0.1"), Some(&5));
    }

    #[tokio::test]
    async fn expiry_set_only_when_window_opens() {
        let store = Arc::new(MapStore::default());
        let limiter = limiter(store.clone(), 10, StoreFailurePolicy::Allow);

        for _ in 0..4 {
            limiter.check(ip("10.0.0.1")).await;
        }
        assert_eq!(store.expiry_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn identities_have_independent_windows() {
        let store = Arc::new(MapStore::default());
        let limiter = limiter(store.clone(), 1, StoreFailurePolicy::Allow);

        assert_eq!(limiter.check(ip("10.0.0.1")).await, RateLimitDecision::Allowed);
        assert_eq!(limiter.check(ip("10.0.0.1")).await, RateLimitDecision::Limited);

        // a saturated neighbor does not consume this client's quota
        assert_eq!(limiter.check(ip("10.0.0.2")).await, RateLimitDecision::Allowed);
    }

    #[tokio::test]
    async fn store_outage_fails_open_by_default() {
        let store = Arc::new(MapStore {
            fail: true,
            ..Default::default()
        });
        let limiter = limiter(store, 1, StoreFailurePolicy::Allow);

        for _ in 0..10 {
            assert_eq!(limiter.check(ip("10.0.0.1")).await, RateLimitDecision::Allowed);
        }
    }

    #[tokio::test]
    async fn store_outage_fails_closed_when_denied() {
        let store = Arc::new(MapStore {
            fail: true,
            ..Default::default()
        });
        let limiter = limiter(store, 1, StoreFailurePolicy::Deny);

        assert_eq!(
            limiter.check(ip("10.0.0.1")).await,
            RateLimitDecision::Unavailable
        );
    }
}
