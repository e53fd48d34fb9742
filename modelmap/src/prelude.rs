//! Convenient re-exports of commonly used types from modelmap.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use modelmap::prelude::*;
//! ```

pub use modelmap_core::{
    backend::{Backend, BackendBuilder, BackendConfig, RESERVED_ID_FIELD, RecordStream},
    cache::{CachedBackend, TtlCache},
    collection::{Collection, CollectionConfig, ModelStream},
    error::{ModelMapError, ModelMapResult},
    model::Model,
    registry::Registry,
    schema::{
        BASE, CLASS_FIELD, CREATED_FIELD, ComputeFn, ID_FIELD, MODIFIED_FIELD, Schema,
        SchemaDescriptor,
    },
};
