//! Key-value store with per-key TTL, injected wherever the gateway needs
//! shared counters. `MemoryKvStore` serves a single instance; a
//! multi-instance deployment plugs in a shared backend behind `KvStore`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Stored value for '{0}' is not a counter")]
    NotACounter(String),
}

/// Fixed-window counter state after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub count: u64,
    pub resets_in: Duration,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Add one to the counter at `key`. A missing or expired key starts at 1
    /// and expires after `ttl`; an existing key keeps its expiry.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<Counter, StoreError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Entries above this count trigger a sweep of expired keys
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep(entries: &mut HashMap<String, Entry>, now: Instant) {
        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        Self::sweep(&mut entries, now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<Counter, StoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        Self::sweep(&mut entries, now);

        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                let count = entry
                    .value
                    .parse::<u64>()
                    .map_err(|_| StoreError::NotACounter(key.to_string()))?
                    + 1;
                entry.value = count.to_string();
                Ok(Counter {
                    count,
                    resets_in: entry.expires_at - now,
                })
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: now + ttl,
                    },
                );
                Ok(Counter {
                    count: 1,
                    resets_in: ttl,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let store = MemoryKvStore::new();
        store.set("k", "v".to_string(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn increment_uses_fixed_window() {
        let store = MemoryKvStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(store.increment("ip:1", window).await.unwrap().count, 1);
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = store.increment("ip:1", window).await.unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.resets_in, Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.increment("ip:1", window).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn increment_rejects_non_counter_values() {
        let store = MemoryKvStore::new();
        store.set("k", "hello".to_string(), Duration::from_secs(60)).await.unwrap();
        assert!(matches!(
            store.increment("k", Duration::from_secs(60)).await,
            Err(StoreError::NotACounter(_))
        ));
    }
}
