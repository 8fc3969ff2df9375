//! Shared utilities for integration testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use security_gateway::store::{CounterStore, StoreError};

/// Start a mock upstream that returns a fixed 200 response with the given
/// content type, counting how many requests reach it.
pub async fn start_mock_upstream(
    addr: SocketAddr,
    content_type: &'static str,
    body: &'static str,
) -> Arc<AtomicU32> {
    let hits = Arc::new(AtomicU32::new(0));
    let listener = TcpListener::bind(addr).await.unwrap();

    let task_hits = hits.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    task_hits.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            content_type,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    hits
}

/// In-memory counter store double with real TTL behavior.
#[derive(Default)]
pub struct MemoryCounterStore {
    entries: Mutex<HashMap<String, (u64, Option<Instant>)>>,
}

impl MemoryCounterStore {
    /// Current counter value for `key` (0 if absent).
    pub fn count(&self, key: &str) -> u64 {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(count, _)| *count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let entry = entries.entry(key.to_string()).or_insert((0, None));
        if let Some(deadline) = entry.1 {
            if deadline <= now {
                // window expired: the store would have evicted the key
                *entry = (0, None);
            }
        }
        entry.0 += 1;
        Ok(entry.0)
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.1 = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

/// Counter store that always fails, for failure-policy tests.
pub struct DownCounterStore;

#[async_trait]
impl CounterStore for DownCounterStore {
    async fn increment(&self, _key: &str) -> Result<u64, StoreError> {
        Err(StoreError::Unreachable("connection refused".into()))
    }

    async fn set_expiry(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unreachable("connection refused".into()))
    }
}
