//! Time-bounded point-lookup caching for backends.
//!
//! [`CachedBackend`] wraps any [`Backend`] and memoizes `get_item` results in
//! an instance-owned cache for a configurable time-to-live (300 seconds by
//! default). Expiry is wall-clock based; writes do not invalidate, so reads
//! may be stale for up to the TTL. That window is an accepted tradeoff.

use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use bson::Document;
use mea::rwlock::RwLock;
use tracing::trace;

use crate::{
    backend::{Backend, DEFAULT_CACHE_TTL_SECS, RecordStream},
    error::ModelMapResult,
    model::Model,
};

struct CacheEntry {
    record: Option<Document>,
    stored_at: Instant,
}

/// An id-keyed record cache with wall-clock expiry.
///
/// Missing records are cached like present ones, so a repeatedly probed
/// absent id does not hammer storage either.
pub struct TtlCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    /// Creates an empty cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// Returns the cached lookup result for `id`, if still fresh.
    ///
    /// The outer `Option` is cache presence; the inner one is the lookup
    /// result itself.
    pub async fn get(&self, id: &str) -> Option<Option<Document>> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.record.clone())
    }

    /// Stores a lookup result for `id`, evicting expired entries.
    pub async fn put(&self, id: &str, record: Option<Document>) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            id.to_string(),
            CacheEntry { record, stored_at: Instant::now() },
        );
    }
}

impl fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// A backend decorator memoizing point lookups.
///
/// Every other operation delegates straight to the wrapped backend.
#[derive(Debug)]
pub struct CachedBackend<B> {
    inner: B,
    cache: TtlCache,
}

impl<B: Backend> CachedBackend<B> {
    /// Wraps a backend with the default 300 second time-to-live.
    pub fn new(inner: B) -> Self {
        Self::with_ttl(inner, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    /// Wraps a backend with the given time-to-live.
    pub fn with_ttl(inner: B, ttl: Duration) -> Self {
        Self { inner, cache: TtlCache::new(ttl) }
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: Backend> Backend for CachedBackend<B> {
    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    fn id_field(&self) -> &str {
        self.inner.id_field()
    }

    async fn make_id(&self, model: &Model) -> ModelMapResult<String> {
        self.inner.make_id(model).await
    }

    async fn add(&self, model: &mut Model) -> ModelMapResult<()> {
        self.inner.add(model).await
    }

    async fn save_model(&self, model: &Model) -> ModelMapResult<String> {
        self.inner.save_model(model).await
    }

    async fn get_item(&self, id: &str) -> ModelMapResult<Option<Document>> {
        if let Some(cached) = self.cache.get(id).await {
            trace!(id, "point lookup served from cache");
            return Ok(cached);
        }

        let record = self.inner.get_item(id).await?;
        self.cache.put(id, record.clone()).await;
        trace!(id, found = record.is_some(), "point lookup cached");

        Ok(record)
    }

    async fn delete(&self, model: &Model) -> ModelMapResult<()> {
        self.inner.delete(model).await
    }

    async fn len(&self) -> ModelMapResult<usize> {
        self.inner.len().await
    }

    async fn iter(&self) -> ModelMapResult<RecordStream> {
        self.inner.iter().await
    }

    async fn find(&self, query: Document, limit: Option<usize>) -> ModelMapResult<RecordStream> {
        self.inner.find(query, limit).await
    }
}
