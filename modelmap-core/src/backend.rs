//! Storage backend contract for collections.
//!
//! This module defines the trait a storage implementation must satisfy for a
//! collection to persist its models, along with the builder trait and the
//! configuration options recognized at backend construction.
//!
//! # Overview
//!
//! A [`Backend`] owns one logical namespace (the collection name supplied at
//! construction) and implements the CRUD and query operations for it. A
//! backend may use a physical identifier key that differs from the model's
//! logical `id` key; the provided [`Backend::to_backend_keys`] and
//! [`Backend::to_model_keys`] translations are applied to outgoing payloads,
//! incoming records, and incoming query filters, so the physical key never
//! leaks above the backend boundary.
//!
//! Id generation produces candidates only. Uniqueness is enforced one layer
//! up, by the collection's allocation loop.
//!
//! # Example
//!
//! ```ignore
//! use modelmap_core::backend::{Backend, BackendConfig};
//!
//! let config = BackendConfig::new("tasks");
//! let backend = MyBackendImpl::builder(config).build().await?;
//! let record = backend.get_item("abc123").await?;
//! # Ok::<(), modelmap_core::error::ModelMapError>(())
//! ```

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::{error::ModelMapResult, model::Model, schema::ID_FIELD};

/// The physical identifier key reserved by document stores.
pub const RESERVED_ID_FIELD: &str = "_id";

/// Default time-to-live for cached point lookups, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// A lazy, restartable sequence of backend records.
///
/// A fresh call to the producing operation re-scans the store.
pub type RecordStream = BoxStream<'static, ModelMapResult<Document>>;

/// Abstract interface for a storage implementation serving one collection.
///
/// All operations are keyed by the namespace fixed at construction. Not-found
/// point lookups are reported as `None`, never as an error. Transient storage
/// failures propagate unchanged; no operation retries.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// The logical namespace this backend serves.
    fn namespace(&self) -> &str;

    /// The physical identifier key used in stored records.
    ///
    /// Defaults to the logical `id` key, meaning no translation.
    fn id_field(&self) -> &str {
        ID_FIELD
    }

    /// Translates a record's logical `id` key to the physical identifier key.
    ///
    /// Applied to outgoing save payloads and incoming query filters. The
    /// inverse of [`Backend::to_model_keys`].
    fn to_backend_keys(&self, data: Document) -> Document {
        translate_key(data, ID_FIELD, self.id_field())
    }

    /// Translates a record's physical identifier key back to the logical `id`.
    ///
    /// Applied to records read out of storage. The inverse of
    /// [`Backend::to_backend_keys`].
    fn to_model_keys(&self, data: Document) -> Document {
        translate_key(data, self.id_field(), ID_FIELD)
    }

    /// Produces a new candidate identifier.
    ///
    /// Candidates are not guaranteed unique; the collection's allocation loop
    /// checks membership before handing one out.
    async fn make_id(&self, model: &Model) -> ModelMapResult<String>;

    /// Adds a brand-new model by driving its save flow.
    ///
    /// The default implementation delegates straight to [`Model::save`],
    /// which finalizes timestamps, id, and discriminator before the record
    /// reaches [`Backend::save_model`].
    async fn add(&self, model: &mut Model) -> ModelMapResult<()> {
        model.save().await
    }

    /// Upserts the model's persistable projection and returns the stored id.
    async fn save_model(&self, model: &Model) -> ModelMapResult<String>;

    /// Point lookup by identifier. `None` means not found.
    async fn get_item(&self, id: &str) -> ModelMapResult<Option<Document>>;

    /// Removes the model's record by its identifier.
    async fn delete(&self, model: &Model) -> ModelMapResult<()>;

    /// Total record count in this namespace.
    async fn len(&self) -> ModelMapResult<usize>;

    /// Streams every record in this namespace, unordered.
    async fn iter(&self) -> ModelMapResult<RecordStream>;

    /// Streams the records matching an exact-match field query, unordered.
    ///
    /// Query keys undergo identifier translation. With `limit`, the stream
    /// yields at most that many records.
    async fn find(&self, query: Document, limit: Option<usize>) -> ModelMapResult<RecordStream>;
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait BackendBuilder {
    type Backend: Backend;

    async fn build(self) -> ModelMapResult<Self::Backend>;
}

/// Configuration options recognized at backend construction.
///
/// A backend is free to ignore options that do not apply to it; the reference
/// in-memory implementation, for instance, has no use for credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Connection target, as host or host:port.
    #[serde(default = "default_host")]
    pub host: String,
    /// User name for authenticated stores.
    #[serde(default)]
    pub user: String,
    /// Password for authenticated stores.
    #[serde(default)]
    pub password: String,
    /// Logical database name.
    #[serde(default = "default_database")]
    pub database: String,
    /// Logical collection name, the namespace all operations are keyed by.
    pub namespace: String,
    /// Time-to-live for cached point lookups, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl BackendConfig {
    /// Creates a configuration for the given namespace with default options.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            user: String::new(),
            password: String::new(),
            database: default_database(),
            namespace: namespace.into(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }

    /// The point-lookup cache time-to-live as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_host() -> String {
    "localhost:27017".to_string()
}

fn default_database() -> String {
    "collections".to_string()
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn translate_key(data: Document, from: &str, to: &str) -> Document {
    if from == to || !data.contains_key(from) {
        return data;
    }

    let mut translated = Document::new();
    for (key, value) in data {
        if key == from {
            translated.insert(to, value);
        } else {
            translated.insert(key, value);
        }
    }
    translated
}
