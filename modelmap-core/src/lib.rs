//! A minimal object-document mapping layer: schema-flexible models bound to a
//! pluggable document store through a collection abstraction.
//!
//! This crate is the core of the modelmap project and provides:
//!
//! - **Schema resolution** ([`schema`]) - Per-type field declarations merged across an inheritance chain
//! - **Models** ([`model`]) - Mutable schema-aware records with computed fields and a save/fetch/destroy lifecycle
//! - **Collections** ([`collection`]) - The single mutation and query gateway per model type
//! - **Collection registry** ([`registry`]) - One live collection instance per name, process-wide
//! - **Backend contract** ([`backend`]) - The trait a storage implementation must satisfy
//! - **Lookup caching** ([`cache`]) - A time-bounded point-lookup decorator for any backend
//! - **Error handling** ([`error`]) - Error types and result types
//! - **Time utilities** ([`time`]) - UTC ISO-8601 timestamp helpers
//!
//! # Example
//!
//! ```ignore
//! use modelmap_core::{
//!     collection::{Collection, CollectionConfig},
//!     schema::{SchemaDescriptor, BASE},
//! };
//! use bson::doc;
//!
//! static TASK: SchemaDescriptor = SchemaDescriptor {
//!     name: "Task",
//!     parent: Some(&BASE),
//!     fields: &["title"],
//!     computed: &[],
//! };
//!
//! let tasks = Collection::new(CollectionConfig::new("Tasks", &TASK));
//! tasks.set_backend(backend);
//!
//! let task = tasks.create(doc! { "title": "buy milk" }).await?;
//! assert_eq!(task.get("title"), Some("buy milk".into()));
//! # Ok::<(), modelmap_core::error::ModelMapError>(())
//! ```

#[allow(unused_extern_crates)]
extern crate self as modelmap_core;

pub mod backend;
pub mod cache;
pub mod collection;
pub mod error;
pub mod model;
pub mod registry;
pub mod schema;
pub mod time;
