//! The schema-aware record type at the heart of the mapping layer.
//!
//! A [`Model`] is a mutable record over a [`bson::Document`], constrained by a
//! resolved [`Schema`](crate::schema::Schema). Declared fields live in the
//! record's stored map and are persisted; keys outside the resolved field set
//! land in an auxiliary map that is never persisted or exported. Computed
//! fields are evaluated lazily on every read and can never be assigned.
//!
//! Models are members of a [`Collection`](crate::collection::Collection); all
//! persistence goes through the owning collection, which models reach via a
//! weak back-reference. A model constructed directly is detached until it is
//! added to a collection, and lifecycle operations on a detached model fail.
//!
//! # Example
//!
//! ```ignore
//! use modelmap_core::{model::Model, schema::{SchemaDescriptor, BASE}};
//! use bson::doc;
//!
//! static TASK: SchemaDescriptor = SchemaDescriptor {
//!     name: "Task",
//!     parent: Some(&BASE),
//!     fields: &["title"],
//!     computed: &[],
//! };
//!
//! let mut task = Model::new(&TASK, doc! { "title": "buy milk" });
//! assert!(task.is_new());
//! task.set("title", "buy oat milk")?;
//! # Ok::<(), modelmap_core::error::ModelMapError>(())
//! ```

use std::{
    fmt,
    sync::{Arc, Weak},
};

use bson::{Bson, Document};
use tracing::debug;

use crate::{
    backend::RESERVED_ID_FIELD,
    collection::{Collection, CollectionState},
    error::{ModelMapError, ModelMapResult},
    schema::{CREATED_FIELD, ID_FIELD, MODIFIED_FIELD, Schema, SchemaDescriptor},
    time,
};

/// A mutable, schema-aware record representing one persisted entity.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<Schema>,
    values: Document,
    extra: Document,
    collection: Option<Weak<CollectionState>>,
}

impl Model {
    /// Constructs a new, unsaved model of the given type from initial data.
    ///
    /// An `id` entry holding an empty or null value is dropped, so a model is
    /// never marked as existing by an empty id.
    pub fn new(class: &'static SchemaDescriptor, data: Document) -> Self {
        Self::build(class, data, None)
    }

    /// Reconstructs a model from backend data, already attached to its
    /// originating collection. Used by the collection's load paths.
    pub(crate) fn from_data(
        class: &'static SchemaDescriptor,
        data: Document,
        collection: &Collection,
    ) -> Self {
        Self::build(class, data, Some(collection.downgrade()))
    }

    fn build(
        class: &'static SchemaDescriptor,
        data: Document,
        collection: Option<Weak<CollectionState>>,
    ) -> Self {
        let mut values = data;
        if values.get(ID_FIELD).is_some_and(is_empty_id) {
            values.remove(ID_FIELD);
        }

        Model {
            schema: Schema::resolve(class),
            values,
            extra: Document::new(),
            collection,
        }
    }

    /// Returns the resolved schema of this model's type.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the concrete model type name.
    pub fn type_name(&self) -> &'static str {
        self.schema.name()
    }

    /// Returns the model's id, if one has been assigned.
    pub fn id(&self) -> Option<&str> {
        self.values.get(ID_FIELD).and_then(Bson::as_str)
    }

    /// True exactly when no `id` key is present, regardless of other state.
    pub fn is_new(&self) -> bool {
        !self.values.contains_key(ID_FIELD)
    }

    /// Returns the value of a field, or `None` when it is absent.
    ///
    /// A computed field is evaluated on each call and shadows a stored value
    /// of the same name. Keys outside the resolved field set are served from
    /// the auxiliary (non-persisted) map.
    pub fn get(&self, key: &str) -> Option<Bson> {
        if let Some(value) = self.schema.compute(key, self) {
            return Some(value);
        }
        self.values
            .get(key)
            .or_else(|| self.extra.get(key))
            .cloned()
    }

    /// Returns the value of a field, or `default` when it is absent.
    pub fn get_or(&self, key: &str, default: impl Into<Bson>) -> Bson {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Returns the raw stored value of a field, without computed shadowing.
    pub fn stored(&self, key: &str) -> Option<&Bson> {
        self.values.get(key)
    }

    /// Assigns a field value.
    ///
    /// Declared fields are written to the persisted record; keys outside the
    /// resolved field set are kept on the instance only and never persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::ComputedFieldWrite`] when `key` names a
    /// computed field. No mutation occurs in that case.
    pub fn set(&mut self, key: &str, value: impl Into<Bson>) -> ModelMapResult<()> {
        if self.schema.is_computed(key) {
            return Err(ModelMapError::ComputedFieldWrite(key.to_string()));
        }

        if self.schema.is_declared(key) {
            self.values.insert(key, value.into());
        } else {
            self.extra.insert(key, value.into());
        }
        Ok(())
    }

    /// Produces the persistable projection of this model.
    ///
    /// Only keys in the resolved field set (plus the backend's reserved
    /// identifier key and, when attached, the collection's discriminator
    /// field) that are actually present are emitted. Absent optional fields
    /// are omitted, not emitted as null. With `include_computed`, computed
    /// fields are evaluated and included as well.
    pub fn to_data(&self, include_computed: bool) -> Document {
        let mut keys: Vec<String> = self
            .schema
            .all_fields(include_computed)
            .into_iter()
            .map(|field| field.to_string())
            .collect();
        keys.push(RESERVED_ID_FIELD.to_string());
        if let Ok(collection) = self.collection() {
            keys.push(collection.class_field().to_string());
        }

        let mut data = Document::new();
        for key in keys {
            let present = self.values.contains_key(&key)
                || (include_computed && self.schema.is_computed(&key));
            if !present {
                continue;
            }
            if let Some(value) = self.get(&key) {
                data.insert(key, value);
            }
        }
        data
    }

    /// Serializes the persistable projection to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelMapError::Serialization`] if the record cannot be
    /// represented as JSON.
    pub fn to_json(&self, include_computed: bool) -> ModelMapResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_data(include_computed))?)
    }

    /// Returns the owning collection.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::Detached`] when the model has never been
    /// attached or its collection is gone.
    pub fn collection(&self) -> ModelMapResult<Collection> {
        self.collection
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Collection::from_state)
            .ok_or(ModelMapError::Detached)
    }

    /// Whether the model currently has an owning collection.
    pub fn is_attached(&self) -> bool {
        self.collection().is_ok()
    }

    pub(crate) fn attach(&mut self, collection: &Collection) {
        self.collection = Some(collection.downgrade());
    }

    /// Stores the model through its owning collection.
    ///
    /// On the first save the creation timestamp, an allocated id, and the
    /// discriminator field are filled in; every save refreshes the
    /// modification timestamp. An id or discriminator already present is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::Detached`] without an owning collection, and
    /// [`ModelMapError::UnregisteredClass`] when the model's type is not
    /// registered with the collection. Both abort before any write.
    pub async fn save(&mut self) -> ModelMapResult<()> {
        self.save_prep().await?;
        let collection = self.collection()?;
        let id = collection.save_model(self).await?;
        debug!(collection = collection.name(), id = id.as_str(), "model saved");
        Ok(())
    }

    async fn save_prep(&mut self) -> ModelMapResult<()> {
        let collection = self.collection()?;

        if self.is_new() {
            self.values.insert(CREATED_FIELD, time::format_iso_now());
        }
        self.values.insert(MODIFIED_FIELD, time::format_iso_now());

        if !self.values.contains_key(ID_FIELD) {
            let id = collection.make_id(&*self).await?;
            self.values.insert(ID_FIELD, id);
        }

        let class_field = collection.class_field().to_string();
        if !self.values.contains_key(&class_field) {
            let name = self.type_name();
            if !collection.is_registered(name) {
                return Err(ModelMapError::UnregisteredClass(
                    name.to_string(),
                    collection.name().to_string(),
                ));
            }
            self.values.insert(class_field, name);
        }

        Ok(())
    }

    /// Reloads this model's fields from the backend by its current id.
    ///
    /// Returns `&mut Self` so calls can be chained.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::Detached`] without an owning collection,
    /// [`ModelMapError::MissingId`] when the model was never saved, and
    /// [`ModelMapError::NotFound`] when the record no longer exists.
    pub async fn fetch(&mut self) -> ModelMapResult<&mut Self> {
        let collection = self.collection()?;
        let id = self
            .id()
            .ok_or(ModelMapError::MissingId)?
            .to_string();

        let fresh = collection.require(&id).await?;
        self.values = fresh.values;

        Ok(self)
    }

    /// Removes this model's record from the collection.
    ///
    /// # Errors
    ///
    /// Returns [`ModelMapError::Detached`] without an owning collection.
    pub async fn destroy(&self) -> ModelMapResult<()> {
        let collection = self.collection()?;
        collection.remove_model(self).await
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{id}"),
            None => write!(f, "<new {}>", self.type_name()),
        }
    }
}

fn is_empty_id(value: &Bson) -> bool {
    match value {
        Bson::Null => true,
        Bson::String(s) => s.is_empty(),
        _ => false,
    }
}
