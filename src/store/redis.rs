//! Redis-backed counter store.
//!
//! Uses a multiplexed connection manager established lazily on first use:
//! a store outage at startup must not prevent the gateway from starting,
//! since the rate limiter's failure policy decides what happens to
//! requests while the store is down.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::store::{CounterStore, StoreError};

/// Counter store client backed by Redis `INCR`/`EXPIRE`.
pub struct RedisCounterStore {
    client: redis::Client,
    conn: Mutex<Option<ConnectionManager>>,
}

impl RedisCounterStore {
    /// Create a store client for `url` (e.g. `redis://127.0.0.1:6379`).
    /// No connection is attempted until the first command.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    /// Get the shared connection, establishing it if needed.
    ///
    /// `ConnectionManager` reconnects on its own once established; only the
    /// initial handshake goes through this retry-on-next-command path.
    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        tracing::info!("Counter store connection established");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let count: u64 = conn
            .incr(key, 1u64)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;
        Ok(count)
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .expire(key, ttl.as_secs() as i64)
            .await
            .map_err(|e| StoreError::Command(e.to_string()))?;
        Ok(())
    }
}
