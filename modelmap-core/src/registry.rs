//! Process-scoped registry of live collections.
//!
//! A [`Registry`] guarantees one live [`Collection`] instance per collection
//! name: the first request for a name creates the collection, every later
//! request returns a handle to the same instance. Collections are never torn
//! down; applications typically construct one registry at startup and share
//! it for the life of the process.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use crate::collection::{Collection, CollectionConfig};

/// Registry mapping collection names to their one live instance.
#[derive(Debug, Default)]
pub struct Registry {
    collections: RwLock<HashMap<String, Collection>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection for the configured name, creating it on first
    /// use.
    ///
    /// A later call with the same name returns a handle to the existing
    /// instance; the remainder of the configuration is ignored in that case.
    pub fn collection(&self, config: CollectionConfig) -> Collection {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .entry(config.name.clone())
            .or_insert_with(|| Collection::new(config))
            .clone()
    }

    /// Returns the collection registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Collection> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// The names of all registered collections.
    pub fn names(&self) -> Vec<String> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BASE, SchemaDescriptor};

    static ITEM: SchemaDescriptor = SchemaDescriptor {
        name: "Item",
        parent: Some(&BASE),
        fields: &[],
        computed: &[],
    };

    #[test]
    fn one_live_instance_per_name() {
        let registry = Registry::new();
        let first = registry.collection(CollectionConfig::new("Items", &ITEM));
        let second = registry.collection(CollectionConfig::new("Items", &ITEM));

        // Both handles share state: the same weak target.
        assert!(first.downgrade().ptr_eq(&second.downgrade()));
    }

    #[test]
    fn lookup_by_name_only_returns_registered_collections() {
        let registry = Registry::new();
        assert!(registry.get("Items").is_none());

        registry.collection(CollectionConfig::new("Items", &ITEM));
        assert!(registry.get("Items").is_some());
        assert_eq!(registry.names(), vec!["Items".to_string()]);
    }
}
