//! The single point of mutation and query for one model type.
//!
//! A [`Collection`] owns exactly one [`Backend`] and mediates every
//! persistence operation for the models it contains: it allocates ids that
//! are unique within the collection, rejects duplicate additions, and
//! reconstructs typed models from raw backend records, resolving polymorphic
//! types through the discriminator field.
//!
//! Collections are cheap-clone handles over shared state; models keep a weak
//! reference to that state, which is how lifecycle methods on a model find
//! their way back here.
//!
//! # Example
//!
//! ```ignore
//! use modelmap_core::collection::{Collection, CollectionConfig};
//! use bson::doc;
//!
//! let tasks = Collection::new(CollectionConfig::new("Tasks", &TASK));
//! tasks.set_backend(backend);
//!
//! let task = tasks.create(doc! { "title": "buy milk" }).await?;
//! assert!(tasks.contains(task.id().unwrap()).await?);
//! # Ok::<(), modelmap_core::error::ModelMapError>(())
//! ```

use std::sync::{Arc, PoisonError, RwLock, Weak};

use bson::{Bson, Document};
use futures::{StreamExt, stream::BoxStream};
use tracing::debug;

use crate::{
    backend::Backend,
    error::{ModelMapError, ModelMapResult},
    model::Model,
    schema::{CLASS_FIELD, SchemaDescriptor},
};

/// A lazy, restartable sequence of models reconstructed from backend records.
pub type ModelStream = BoxStream<'static, ModelMapResult<Model>>;

/// Configuration for one collection.
#[derive(Debug)]
pub struct CollectionConfig {
    /// Collection name, used as the registry key.
    pub name: String,
    /// The discriminator field stored alongside every record.
    pub class_field: String,
    /// The default model type of this collection.
    pub model_class: &'static SchemaDescriptor,
    /// The closed set of alternate model types this collection may hold.
    ///
    /// When non-empty, records are dispatched to one of these by the
    /// discriminator field on load.
    pub model_classes: Vec<&'static SchemaDescriptor>,
}

impl CollectionConfig {
    /// Creates a configuration with the default discriminator field and no
    /// alternate types.
    pub fn new(name: impl Into<String>, model_class: &'static SchemaDescriptor) -> Self {
        Self {
            name: name.into(),
            class_field: CLASS_FIELD.to_string(),
            model_class,
            model_classes: Vec::new(),
        }
    }

    /// Declares the closed set of alternate model types.
    pub fn with_classes(
        mut self,
        classes: impl IntoIterator<Item = &'static SchemaDescriptor>,
    ) -> Self {
        self.model_classes = classes.into_iter().collect();
        self
    }

    /// Overrides the discriminator field name.
    pub fn with_class_field(mut self, field: impl Into<String>) -> Self {
        self.class_field = field.into();
        self
    }
}

#[derive(Debug)]
pub(crate) struct CollectionState {
    name: String,
    class_field: String,
    model_class: &'static SchemaDescriptor,
    model_classes: Vec<&'static SchemaDescriptor>,
    backend: RwLock<Option<Arc<dyn Backend>>>,
}

/// The sole mutation and query gateway for one model type.
#[derive(Debug, Clone)]
pub struct Collection {
    state: Arc<CollectionState>,
}

impl Collection {
    /// Creates a collection from its configuration, with no backend attached.
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            state: Arc::new(CollectionState {
                name: config.name,
                class_field: config.class_field,
                model_class: config.model_class,
                model_classes: config.model_classes,
                backend: RwLock::new(None),
            }),
        }
    }

    pub(crate) fn from_state(state: Arc<CollectionState>) -> Self {
        Self { state }
    }

    pub(crate) fn downgrade(&self) -> Weak<CollectionState> {
        Arc::downgrade(&self.state)
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// The discriminator field name stored alongside every record.
    pub fn class_field(&self) -> &str {
        &self.state.class_field
    }

    /// The default model type of this collection.
    pub fn model_class(&self) -> &'static SchemaDescriptor {
        self.state.model_class
    }

    /// Attaches (or replaces) the storage backend.
    pub fn set_backend(&self, backend: Arc<dyn Backend>) {
        debug!(collection = self.name(), "backend attached");
        *self
            .state
            .backend
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(backend);
    }

    /// Returns the attached backend.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::BackendNotConfigured`] when no backend has
    /// been attached yet. Every persistence operation goes through this gate.
    pub fn backend(&self) -> ModelMapResult<Arc<dyn Backend>> {
        self.state
            .backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ModelMapError::BackendNotConfigured(self.name().to_string()))
    }

    /// Whether the given type name is the default or one of the alternates.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.state.model_class.name == type_name
            || self
                .state
                .model_classes
                .iter()
                .any(|class| class.name == type_name)
    }

    /// Resolves the model type to instantiate for a raw record.
    ///
    /// The record's discriminator value is looked up among the alternates by
    /// name; an unknown value falls back to the first declared alternate. A
    /// collection without alternates always resolves its default type.
    pub fn class_for(&self, data: &Document) -> &'static SchemaDescriptor {
        let alternates = &self.state.model_classes;
        if alternates.is_empty() {
            return self.state.model_class;
        }

        data.get(self.class_field())
            .and_then(Bson::as_str)
            .and_then(|name| {
                alternates
                    .iter()
                    .find(|class| class.name == name)
                    .copied()
            })
            .unwrap_or(alternates[0])
    }

    /// Reconstructs a typed model from a raw backend record and attaches it
    /// to this collection.
    pub fn model_from_data(&self, data: Document) -> Model {
        Model::from_data(self.class_for(&data), data, self)
    }

    /// Allocates an id that is not currently present in this collection.
    ///
    /// Loops asking the backend for candidates until one misses the
    /// membership probe. Best-effort under concurrent writers; a storage
    /// level unique constraint is the real safety net.
    pub async fn make_id(&self, model: &Model) -> ModelMapResult<String> {
        let backend = self.backend()?;
        loop {
            let candidate = backend.make_id(model).await?;
            if !self.contains(&candidate).await? {
                return Ok(candidate);
            }
        }
    }

    /// Adds a model to this collection, driving its first save.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::DuplicateId`] when the model already carries
    /// an id that exists here; nothing is written in that case.
    pub async fn add(&self, model: &mut Model) -> ModelMapResult<()> {
        if let Some(id) = model.id() {
            if self.contains(id).await? {
                return Err(ModelMapError::DuplicateId(
                    id.to_string(),
                    self.name().to_string(),
                ));
            }
        }

        let backend = self.backend()?;
        model.attach(self);
        debug!(collection = self.name(), class = model.type_name(), "adding model");
        backend.add(model).await
    }

    /// Creates and adds a model of this collection's default type.
    pub async fn create(&self, data: Document) -> ModelMapResult<Model> {
        self.create_class(self.state.model_class, data).await
    }

    /// Creates and adds a model of the given type.
    pub async fn create_class(
        &self,
        class: &'static SchemaDescriptor,
        data: Document,
    ) -> ModelMapResult<Model> {
        let mut model = Model::new(class, data);
        self.add(&mut model).await?;
        Ok(model)
    }

    /// Point lookup returning `None` on a miss.
    pub async fn get(&self, id: &str) -> ModelMapResult<Option<Model>> {
        let backend = self.backend()?;
        Ok(backend
            .get_item(id)
            .await?
            .map(|data| self.model_from_data(data)))
    }

    /// Point lookup that treats a miss as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::NotFound`] when no record has the id.
    pub async fn require(&self, id: &str) -> ModelMapResult<Model> {
        self.get(id).await?.ok_or_else(|| {
            ModelMapError::NotFound(id.to_string(), self.name().to_string())
        })
    }

    /// Membership test by id. A miss is `false`, never an error.
    pub async fn contains(&self, id: &str) -> ModelMapResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Total number of models in this collection.
    pub async fn count(&self) -> ModelMapResult<usize> {
        self.backend()?.len().await
    }

    /// Streams every model in this collection, unordered.
    pub async fn iter(&self) -> ModelMapResult<ModelStream> {
        let records = self.backend()?.iter().await?;
        let collection = self.clone();
        Ok(records
            .map(move |record| record.map(|data| collection.model_from_data(data)))
            .boxed())
    }

    /// Streams the models matching an exact-match field query.
    ///
    /// With `limit`, at most that many models are yielded.
    pub async fn find(
        &self,
        query: Document,
        limit: Option<usize>,
    ) -> ModelMapResult<ModelStream> {
        let records = self.backend()?.find(query, limit).await?;
        let collection = self.clone();
        Ok(records
            .map(move |record| record.map(|data| collection.model_from_data(data)))
            .boxed())
    }

    /// Removes the model with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::NotFound`] when no record has the id.
    pub async fn remove(&self, id: &str) -> ModelMapResult<()> {
        let model = self.require(id).await?;
        self.remove_model(&model).await
    }

    /// Removes the given model's backend record.
    pub async fn remove_model(&self, model: &Model) -> ModelMapResult<()> {
        debug!(collection = self.name(), id = model.id(), "removing model");
        self.backend()?.delete(model).await
    }

    pub(crate) async fn save_model(&self, model: &Model) -> ModelMapResult<String> {
        self.backend()?.save_model(model).await
    }
}
