//! In-memory storage backend for modelmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `Backend` contract. It uses async-aware read-write locks for concurrent
//! access and is ideal for development, testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Contract-faithful identifiers** - Records are stored under the reserved `_id` key, exercising the translation rules real document stores need
//! - **Exact-match queries** - `find` with per-field equality and an optional limit
//!
//! # Quick Start
//!
//! ```ignore
//! use modelmap_core::{
//!     backend::{BackendBuilder, BackendConfig},
//!     collection::{Collection, CollectionConfig},
//!     schema::{SchemaDescriptor, BASE},
//! };
//! use modelmap_memory::MemoryBackend;
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
//!     let backend = MemoryBackend::builder(BackendConfig::new("Tasks"))
//!         .build()
//!         .await?;
//!
//!     let tasks = Collection::new(CollectionConfig::new("Tasks", &TASK));
//!     tasks.set_backend(Arc::new(backend));
//!
//!     let task = tasks.create(doc! { "title": "buy milk" }).await?;
//!     assert!(!task.is_new());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as modelmap_memory;

pub mod filter;
pub mod store;

pub use store::{MemoryBackend, MemoryBackendBuilder};
