//! Error types and result types for the mapping layer.
//!
//! This module provides error handling for all model and collection operations.
//! Use [`ModelMapResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur in the mapping layer.
///
/// This enum covers collection configuration, model lifecycle issues,
/// schema violations, and backend-specific errors.
#[derive(Error, Debug)]
pub enum ModelMapError {
    /// A persistence operation was attempted on a collection with no backend attached.
    #[error("Collection {0} has no backend configured")]
    BackendNotConfigured(String),
    /// Point lookup for an identifier that does not exist in the collection.
    /// The first argument is the model id, the second is the collection name.
    #[error("Model {0} not found in collection {1}")]
    NotFound(String, String),
    /// A model carrying an id that already exists was added to the collection.
    /// The first argument is the model id, the second is the collection name.
    #[error("Id {0} already exists in collection {1}")]
    DuplicateId(String, String),
    /// A model's concrete type is not among the types registered with its collection.
    #[error("Model class {0} is not registered with collection {1}")]
    UnregisteredClass(String, String),
    /// A lifecycle operation was called on a model with no owning collection.
    #[error("Model is not attached to a collection")]
    Detached,
    /// An attempt was made to assign a value to a computed field.
    #[error("Field {0} is computed and cannot be assigned")]
    ComputedFieldWrite(String),
    /// A lifecycle operation required an id the model does not carry yet.
    #[error("Model has no id")]
    MissingId,
    /// A timestamp string was not in UTC ISO-8601 form with the trailing designator.
    #[error("Timestamp must be a UTC ISO-8601 string with trailing 'Z': {0}")]
    Timestamp(String),
    /// Serialization/deserialization error when converting record data.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for mapping-layer operations.
///
/// This type alias is used throughout the crate to indicate operations that may fail
/// with a [`ModelMapError`].
pub type ModelMapResult<T> = Result<T, ModelMapError>;

impl From<SerdeJsonError> for ModelMapError {
    fn from(err: SerdeJsonError) -> Self {
        ModelMapError::Serialization(err.to_string())
    }
}
