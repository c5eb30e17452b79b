use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::source::RoutingSource;
use super::table::RoutingTable;

struct Cached {
    table: Arc<RoutingTable>,
    fetched_at: Instant,
    invalidated: bool,
}

/// TTL cache around a routing source.
///
/// The current table is an `Arc` swapped whole on refresh. A reader that
/// finds the entry stale while another task is already refreshing keeps
/// using the old table rather than waiting. A failed refresh keeps the last
/// good table; the fallback table is only served when nothing was ever loaded.
pub struct RoutingTableCache {
    source: Arc<dyn RoutingSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    current: RwLock<Option<Cached>>,
    refresh: Mutex<()>,
    /// Completed fetch attempts, successful or not
    attempts: AtomicU64,
    fallback: Arc<RoutingTable>,
}

impl RoutingTableCache {
    pub fn new(source: Arc<dyn RoutingSource>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            attempts: AtomicU64::new(0),
            fallback: Arc::new(RoutingTable::fallback()),
        }
    }

    /// Never fails: a table that cannot be loaded yields the last good table,
    /// or the fallback table on a cold cache
    pub async fn table(&self) -> Arc<RoutingTable> {
        let seen = self.attempts.load(Ordering::Acquire);

        let stale = match self.cached().await {
            (Some(table), true) => return table,
            (table, _) => table,
        };

        let _guard = match (self.refresh.try_lock(), &stale) {
            (Ok(guard), _) => guard,
            // Someone else is refreshing; keep serving what we have
            (Err(_), Some(stale)) => return stale.clone(),
            (Err(_), None) => self.refresh.lock().await,
        };

        // A fetch finished while we waited for the lock; share its outcome
        if self.attempts.load(Ordering::Acquire) != seen {
            return self.cached().await.0.unwrap_or_else(|| self.fallback.clone());
        }

        let table = match self.fetch().await {
            Some(table) => {
                let table = Arc::new(table);
                *self.current.write().await = Some(Cached {
                    table: table.clone(),
                    fetched_at: Instant::now(),
                    invalidated: false,
                });
                table
            }
            None => match stale {
                Some(stale) => {
                    tracing::warn!("Keeping last good routing table from {}", self.source.describe());
                    stale
                }
                None => self.fallback.clone(),
            },
        };

        self.attempts.fetch_add(1, Ordering::AcqRel);
        table
    }

    /// Mark the cached table stale so the next read goes back to the source.
    /// The old table stays available if that read fails.
    pub async fn invalidate(&self) {
        if let Some(cached) = self.current.write().await.as_mut() {
            cached.invalidated = true;
        }
    }

    /// Cached table if any, and whether it is still fresh
    async fn cached(&self) -> (Option<Arc<RoutingTable>>, bool) {
        let current = self.current.read().await;
        match current.as_ref() {
            Some(cached) => (
                Some(cached.table.clone()),
                !cached.invalidated && cached.fetched_at.elapsed() < self.ttl,
            ),
            None => (None, false),
        }
    }

    async fn fetch(&self) -> Option<RoutingTable> {
        let result = tokio::time::timeout(self.fetch_timeout, self.source.get_app_urls()).await;

        match result {
            Ok(Ok(Some(pairs))) => {
                let (table, rejected) = RoutingTable::from_pairs(pairs);
                if !rejected.is_empty() {
                    tracing::error!(
                        "Ignored {} invalid routing entries from {}: {:?}",
                        rejected.len(),
                        self.source.describe(),
                        rejected
                    );
                }
                tracing::debug!("Loaded {} routes from {}", table.len(), self.source.describe());
                Some(table)
            }
            Ok(Ok(None)) => {
                tracing::warn!("Routing table missing from {}", self.source.describe());
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("Routing table unavailable ({})", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Routing table fetch from {} timed out after {:?}",
                    self.source.describe(),
                    self.fetch_timeout
                );
                None
            }
        }
    }
}
