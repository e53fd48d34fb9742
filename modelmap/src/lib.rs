//! Main modelmap crate providing a unified interface to the mapping layer.
//!
//! This crate is the primary entry point for users of the modelmap project.
//! It re-exports the core modules and provides convenient access to the
//! bundled storage backend.
//!
//! # Features
//!
//! - **Schema-aware models** - Declare a type's fields once, inherit and union them across a type hierarchy
//! - **Computed fields** - Read-only derived fields evaluated on every read, never stored
//! - **Collections** - One mutation and query gateway per model type, with collection-unique id allocation
//! - **Pluggable storage** - A backend contract with a bundled in-memory reference implementation and a TTL caching decorator
//!
//! # Quick Start
//!
//! ```ignore
//! use modelmap::{prelude::*, memory::MemoryBackend};
//! use bson::doc;
//! use std::sync::Arc;
//!
//! static TASK: SchemaDescriptor = SchemaDescriptor {
//!     name: "Task",
//!     parent: Some(&BASE),
//!     fields: &["title"],
//!     computed: &[],
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::new();
//!     let tasks = registry.collection(CollectionConfig::new("Tasks", &TASK));
//!     tasks.set_backend(Arc::new(MemoryBackend::new(&BackendConfig::new("Tasks"))));
//!
//!     // Create and persist a model through the collection.
//!     let mut task = tasks.create(doc! { "title": "buy milk" }).await?;
//!     println!("saved task {}", task.id().unwrap());
//!
//!     // Mutate and save again; the id and creation timestamp are stable.
//!     task.set("title", "buy oat milk")?;
//!     task.save().await?;
//!
//!     // Reload from storage and remove.
//!     task.fetch().await?;
//!     task.destroy().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Caching
//!
//! Wrap any backend in [`cache::CachedBackend`] to memoize point lookups for
//! a time-to-live window. Within the window repeated lookups of one id are
//! served from the cache even if the underlying store changed; staleness up
//! to the TTL is the documented tradeoff.
//!
//! ```ignore
//! use modelmap::{cache::CachedBackend, memory::MemoryBackend};
//!
//! let backend = CachedBackend::new(MemoryBackend::new(&config));
//! collection.set_backend(std::sync::Arc::new(backend));
//! ```

pub mod prelude;

pub use modelmap_core::{backend, cache, collection, error, model, registry, schema, time};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use modelmap_memory::{MemoryBackend, MemoryBackendBuilder};
}
