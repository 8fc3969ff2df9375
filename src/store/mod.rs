//! Counter store subsystem.
//!
//! The only durable state the gateway depends on — per-client window
//! counters — lives in an external store reached through the
//! [`CounterStore`] capability. Correctness under concurrent requests
//! rests on the store's atomic increment, not on any local lock, which is
//! what lets any number of gateway instances share one quota per client.

pub mod redis;

pub use self::redis::RedisCounterStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors talking to the counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("counter store unreachable: {0}")]
    Unreachable(String),

    /// The store was reached but the command failed.
    #[error("counter store command failed: {0}")]
    Command(String),
}

/// Atomic increment-with-expiry, the one primitive rate limiting needs.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter at `key`, creating it at 1 if
    /// absent. Returns the post-increment value.
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// Set the time-to-live for `key`.
    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;
}
