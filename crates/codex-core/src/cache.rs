//! Resolution cache: memory (TTL) → override store → remote document.
//!
//! A resolved collection is held as an `Arc<Vec<Entity>>`; repeated calls inside the
//! TTL window hand out the same allocation. Entries are replaced whole, so readers
//! never observe a partially written collection.

use crate::collection::CollectionKey;
use crate::entity::{dedup_by_id, entities_from_values, Entity};
use crate::error::CodexResult;
use crate::remote::{items_from_document, RemoteSource};
use crate::store::OverrideStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default lifetime of a cache entry: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default period of the background invalidation task: 10 minutes.
pub const DEFAULT_AUTO_INVALIDATE: Duration = Duration::from_secs(10 * 60);

/// Tier a cached collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedFrom {
    Override,
    Remote,
}

/// Where the next uncached resolution of a collection would read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Override { storage_key: &'static str },
    Remote { location: String },
}

struct CacheEntry {
    data: Arc<Vec<Entity>>,
    expires_at: Instant,
    stored_at: DateTime<Utc>,
    source: ResolvedFrom,
}

/// Snapshot of one cache entry for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryInfo {
    pub collection: CollectionKey,
    pub len: usize,
    pub stored_at: DateTime<Utc>,
    pub source: ResolvedFrom,
    pub expired: bool,
}

/// Result of refreshing one collection in [`ResolutionCache::refresh_all`].
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub collection: CollectionKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ResolutionCache {
    store: Arc<OverrideStore>,
    remote: Arc<dyn RemoteSource>,
    entries: DashMap<CollectionKey, CacheEntry>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(store: Arc<OverrideStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self::with_ttl(store, remote, DEFAULT_TTL)
    }

    pub fn with_ttl(store: Arc<OverrideStore>, remote: Arc<dyn RemoteSource>, ttl: Duration) -> Self {
        Self {
            store,
            remote,
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve the collection for `key`.
    ///
    /// Returns the cached allocation while it is fresh (unless `force_refresh`), else a
    /// non-empty override record, else the remote document's items. Fails with
    /// `DataUnavailable` only when the remote tier is reached and cannot be read.
    pub async fn resolve(&self, key: CollectionKey, force_refresh: bool) -> CodexResult<Arc<Vec<Entity>>> {
        if !force_refresh {
            if let Some(data) = self.fresh(key) {
                debug!(target: "codex::cache", collection = %key, len = data.len(), "Serving cached collection");
                return Ok(data);
            }
        }

        let local = self.store.read(key);
        if !local.is_empty() {
            let data = self.store_entry(key, dedup_by_id(local), ResolvedFrom::Override);
            info!(target: "codex::cache", collection = %key, len = data.len(), "Resolved from override store");
            return Ok(data);
        }

        debug!(target: "codex::cache", collection = %key, location = %self.remote.location(key), "Fetching remote document");
        let doc = self.remote.fetch(key).await?;
        let items = entities_from_values(items_from_document(key, doc));
        let data = self.store_entry(key, dedup_by_id(items), ResolvedFrom::Remote);
        info!(target: "codex::cache", collection = %key, len = data.len(), "Resolved from remote document");
        Ok(data)
    }

    /// Like [`resolve`](Self::resolve), but a failure yields an empty collection and a warning.
    pub async fn resolve_or_empty(&self, key: CollectionKey, force_refresh: bool) -> Arc<Vec<Entity>> {
        match self.resolve(key, force_refresh).await {
            Ok(data) => data,
            Err(e) => {
                warn!(target: "codex::cache", collection = %key, error = %e, "Collection unavailable; treating as empty");
                Arc::new(Vec::new())
            }
        }
    }

    /// Drop the entry for `key`, or every entry when `None`.
    pub fn invalidate(&self, key: Option<CollectionKey>) {
        match key {
            Some(k) => {
                self.entries.remove(&k);
                debug!(target: "codex::cache", collection = %k, "Cache entry invalidated");
            }
            None => {
                self.entries.clear();
                debug!(target: "codex::cache", "All cache entries invalidated");
            }
        }
    }

    /// Clear everything and force-resolve every collection. One collection failing
    /// does not stop the others.
    pub async fn refresh_all(&self) -> Vec<RefreshOutcome> {
        info!(target: "codex::cache", "Refreshing all collections");
        self.invalidate(None);
        let mut outcomes = Vec::with_capacity(CollectionKey::all().len());
        for key in CollectionKey::all() {
            let outcome = match self.resolve(key, true).await {
                Ok(data) => RefreshOutcome {
                    collection: key,
                    count: Some(data.len()),
                    error: None,
                },
                Err(e) => {
                    warn!(target: "codex::cache", collection = %key, error = %e, "Refresh failed");
                    RefreshOutcome {
                        collection: key,
                        count: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn has_override_data(&self, key: CollectionKey) -> bool {
        self.store.has_data(key)
    }

    pub fn data_source(&self, key: CollectionKey) -> DataSource {
        if self.has_override_data(key) {
            DataSource::Override {
                storage_key: key.storage_key(),
            }
        } else {
            DataSource::Remote {
                location: self.remote.location(key),
            }
        }
    }

    pub fn entry_info(&self, key: CollectionKey) -> Option<CacheEntryInfo> {
        self.entries.get(&key).map(|entry| CacheEntryInfo {
            collection: key,
            len: entry.data.len(),
            stored_at: entry.stored_at,
            source: entry.source,
            expired: entry.expires_at <= Instant::now(),
        })
    }

    /// Background task clearing every entry each `period`. Staleness bound only;
    /// `resolve` checks expiry regardless.
    pub fn spawn_auto_invalidate(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        info!(target: "codex::cache", period_secs = period.as_secs(), "Auto-invalidation scheduled");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                debug!(target: "codex::cache", "Scheduled invalidation");
                cache.invalidate(None);
            }
        })
    }

    fn fresh(&self, key: CollectionKey) -> Option<Arc<Vec<Entity>>> {
        let entry = self.entries.get(&key)?;
        (entry.expires_at > Instant::now()).then(|| Arc::clone(&entry.data))
    }

    fn store_entry(&self, key: CollectionKey, items: Vec<Entity>, source: ResolvedFrom) -> Arc<Vec<Entity>> {
        let data = Arc::new(items);
        self.entries.insert(
            key,
            CacheEntry {
                data: Arc::clone(&data),
                expires_at: Instant::now() + self.ttl,
                stored_at: Utc::now(),
                source,
            },
        );
        data
    }
}
