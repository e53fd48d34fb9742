//! In-memory reference backend.
//!
//! This module provides a simple document-store backend keeping records in a
//! HashMap behind an async-safe read-write lock. Records are stored under the
//! reserved `_id` key, so the logical/physical identifier translation of the
//! backend contract is exercised exactly as it would be against a real
//! document database.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use rand::Rng;
use tracing::debug;

use modelmap_core::{
    backend::{Backend, BackendBuilder, BackendConfig, RESERVED_ID_FIELD, RecordStream},
    error::{ModelMapError, ModelMapResult},
    model::Model,
};

use crate::filter::matches;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LENGTH: usize = 12;

type RecordMap = HashMap<String, Document>;

/// Thread-safe in-memory document storage backend.
///
/// `MemoryBackend` is cloneable and uses an `Arc`-wrapped record map, so
/// clones of one instance share the same underlying store. Iteration and
/// queries clone a snapshot out under the read lock; the returned streams
/// never hold the lock, and a fresh call re-scans the store.
///
/// Candidate ids are short random strings; collection-level allocation is
/// responsible for uniqueness.
///
/// # Example
///
/// ```ignore
/// use modelmap_memory::MemoryBackend;
/// use modelmap_core::backend::{Backend, BackendBuilder, BackendConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = MemoryBackend::builder(BackendConfig::new("Tasks"))
///         .build()
///         .await?;
///     assert_eq!(backend.len().await?, 0);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    namespace: String,
    database: String,
    records: Arc<RwLock<RecordMap>>,
}

impl MemoryBackend {
    /// Creates an empty backend for the configured namespace.
    ///
    /// Connection target and credentials in the configuration are accepted
    /// and ignored; an in-memory store has nothing to dial.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            database: config.database.clone(),
            records: Arc::new(RwLock::new(RecordMap::new())),
        }
    }

    /// Creates a builder for constructing a `MemoryBackend`.
    pub fn builder(config: BackendConfig) -> MemoryBackendBuilder {
        MemoryBackendBuilder { config }
    }

    /// The logical database name this backend was configured with.
    pub fn database(&self) -> &str {
        &self.database
    }

    fn random_id() -> String {
        let mut rng = rand::thread_rng();
        (0..ID_LENGTH)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn id_field(&self) -> &str {
        RESERVED_ID_FIELD
    }

    async fn make_id(&self, _model: &Model) -> ModelMapResult<String> {
        Ok(Self::random_id())
    }

    async fn save_model(&self, model: &Model) -> ModelMapResult<String> {
        let id = model.id().ok_or(ModelMapError::MissingId)?.to_string();
        let record = self.to_backend_keys(model.to_data(false));

        let mut records = self.records.write().await;
        records.insert(id.clone(), record);
        debug!(namespace = self.namespace.as_str(), id = id.as_str(), "record saved");

        Ok(id)
    }

    async fn get_item(&self, id: &str) -> ModelMapResult<Option<Document>> {
        let records = self.records.read().await;
        Ok(records
            .get(id)
            .cloned()
            .map(|record| self.to_model_keys(record)))
    }

    async fn delete(&self, model: &Model) -> ModelMapResult<()> {
        let id = model.id().ok_or(ModelMapError::MissingId)?;

        let mut records = self.records.write().await;
        records.remove(id);
        debug!(namespace = self.namespace.as_str(), id, "record deleted");

        Ok(())
    }

    async fn len(&self) -> ModelMapResult<usize> {
        Ok(self.records.read().await.len())
    }

    async fn iter(&self) -> ModelMapResult<RecordStream> {
        let records = self.records.read().await;
        let snapshot: Vec<ModelMapResult<Document>> = records
            .values()
            .cloned()
            .map(|record| Ok(self.to_model_keys(record)))
            .collect();

        Ok(stream::iter(snapshot).boxed())
    }

    async fn find(&self, query: Document, limit: Option<usize>) -> ModelMapResult<RecordStream> {
        let query = self.to_backend_keys(query);

        let records = self.records.read().await;
        let snapshot: Vec<ModelMapResult<Document>> = records
            .values()
            .filter(|record| matches(record, &query))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .map(|record| Ok(self.to_model_keys(record)))
            .collect();

        Ok(stream::iter(snapshot).boxed())
    }
}

/// Builder for constructing [`MemoryBackend`] instances.
pub struct MemoryBackendBuilder {
    config: BackendConfig,
}

#[async_trait]
impl BackendBuilder for MemoryBackendBuilder {
    type Backend = MemoryBackend;

    /// Builds and returns a new [`MemoryBackend`] instance.
    ///
    /// This always succeeds and returns a freshly initialized, empty store.
    async fn build(self) -> ModelMapResult<Self::Backend> {
        Ok(MemoryBackend::new(&self.config))
    }
}
