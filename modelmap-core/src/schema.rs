//! Schema declaration and resolution for model types.
//!
//! Every model type is described by a [`SchemaDescriptor`]: the fields the type
//! declares itself, its computed-field table, and an optional parent descriptor.
//! [`Schema::resolve`] merges a descriptor chain into a single resolved
//! [`Schema`], unioning field lists and computed tables across all ancestors.
//! Resolution is memoized per descriptor, so repeated calls for the same type
//! are cheap and always produce the same result.
//!
//! # Example
//!
//! ```ignore
//! use modelmap_core::schema::{Schema, SchemaDescriptor, BASE};
//!
//! static TASK: SchemaDescriptor = SchemaDescriptor {
//!     name: "Task",
//!     parent: Some(&BASE),
//!     fields: &["title", "done"],
//!     computed: &[],
//! };
//!
//! let schema = Schema::resolve(&TASK);
//! assert!(schema.is_declared("title"));
//! assert!(schema.is_declared("id")); // inherited from BASE
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

use bson::Bson;

use crate::model::Model;

/// The logical identifier field of every model.
pub const ID_FIELD: &str = "id";
/// Creation timestamp field, set once on first save.
pub const CREATED_FIELD: &str = "created";
/// Modification timestamp field, refreshed on every save.
pub const MODIFIED_FIELD: &str = "modified";
/// Default discriminator field storing the concrete model type name.
pub const CLASS_FIELD: &str = "class";

/// A value provider for a computed field.
///
/// Invoked against the model each time the field is read. The produced value
/// is never stored and never cached.
pub type ComputeFn = fn(&Model) -> Bson;

/// Static description of one model type's own schema contribution.
///
/// Descriptors form a chain through `parent`; [`Schema::resolve`] folds the
/// chain into the full field set. Descriptors are declared as `static` items,
/// so a type's schema is fixed for the lifetime of the process.
#[derive(Debug)]
pub struct SchemaDescriptor {
    /// Concrete model type name, stored in the discriminator field.
    pub name: &'static str,
    /// Parent descriptor whose fields and computed table are inherited.
    pub parent: Option<&'static SchemaDescriptor>,
    /// Field names this type declares itself.
    pub fields: &'static [&'static str],
    /// Computed fields this type declares itself, as (name, provider) pairs.
    pub computed: &'static [(&'static str, ComputeFn)],
}

/// The root descriptor every model type ultimately inherits from.
///
/// Declares the identifier, the two lifecycle timestamps, and the default
/// discriminator field.
pub static BASE: SchemaDescriptor = SchemaDescriptor {
    name: "Model",
    parent: None,
    fields: &[ID_FIELD, CREATED_FIELD, MODIFIED_FIELD, CLASS_FIELD],
    computed: &[],
};

static RESOLVED: LazyLock<RwLock<HashMap<usize, Arc<Schema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A fully resolved model schema: the union of every field and computed field
/// declared anywhere along one descriptor chain.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    fields: Vec<&'static str>,
    computed: HashMap<&'static str, ComputeFn>,
}

impl Schema {
    /// Resolves a descriptor chain into a merged schema.
    ///
    /// Field lists are unioned with duplicates removed; computed tables are
    /// union-merged with the descriptor's own entry winning over an ancestor's
    /// entry of the same name. The result is memoized per descriptor, so every
    /// subsequent call for the same descriptor returns the same schema.
    pub fn resolve(descriptor: &'static SchemaDescriptor) -> Arc<Schema> {
        let key = descriptor as *const SchemaDescriptor as usize;

        if let Some(schema) = RESOLVED
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return schema.clone();
        }

        let merged = Arc::new(Self::merge(descriptor));
        RESOLVED
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(merged)
            .clone()
    }

    fn merge(descriptor: &'static SchemaDescriptor) -> Schema {
        let mut fields = Vec::new();
        let mut computed = HashMap::new();
        Self::fold(descriptor, &mut fields, &mut computed);

        Schema { name: descriptor.name, fields, computed }
    }

    fn fold(
        descriptor: &'static SchemaDescriptor,
        fields: &mut Vec<&'static str>,
        computed: &mut HashMap<&'static str, ComputeFn>,
    ) {
        // Ancestors first, so a descriptor's own computed entries override.
        if let Some(parent) = descriptor.parent {
            Self::fold(parent, fields, computed);
        }

        for field in descriptor.fields {
            if !fields.contains(field) {
                fields.push(field);
            }
        }
        for (name, provider) in descriptor.computed {
            computed.insert(*name, *provider);
        }
    }

    /// Returns the concrete model type name this schema resolves.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the stored (non-computed) field names.
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    /// Returns the names of all computed fields.
    pub fn computed_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.computed.keys().copied()
    }

    /// Returns the stored field names plus, optionally, the computed names appended.
    pub fn all_fields(&self, include_computed: bool) -> Vec<&'static str> {
        let mut fields = self.fields.clone();
        if include_computed {
            fields.extend(self.computed.keys().copied());
        }
        fields
    }

    /// Whether the name is a declared stored field.
    pub fn is_declared(&self, name: &str) -> bool {
        self.fields.iter().any(|field| *field == name)
    }

    /// Whether the name is a computed field.
    pub fn is_computed(&self, name: &str) -> bool {
        self.computed.contains_key(name)
    }

    /// Whether the name is part of the resolved field set, stored or computed.
    pub fn contains(&self, name: &str) -> bool {
        self.is_declared(name) || self.is_computed(name)
    }

    /// Invokes the computed-field provider for `name`, if one exists.
    pub fn compute(&self, name: &str, model: &Model) -> Option<Bson> {
        self.computed.get(name).map(|provider| provider(model))
    }
}
