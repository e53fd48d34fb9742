//! Point-lookup caching behavior and collection id allocation.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use modelmap::{memory::MemoryBackend, prelude::*};

static TASK: SchemaDescriptor = SchemaDescriptor {
    name: "Task",
    parent: Some(&BASE),
    fields: &["title"],
    computed: &[],
};

fn collection_with(backend: Arc<dyn Backend>) -> Collection {
    let tasks = Collection::new(CollectionConfig::new("Tasks", &TASK));
    tasks.set_backend(backend);
    tasks
}

#[tokio::test]
async fn lookups_within_the_ttl_ignore_underlying_writes() {
    let raw = MemoryBackend::new(&BackendConfig::new("Tasks"));
    let tasks = collection_with(Arc::new(raw.clone()));

    let mut task = tasks.create(doc! { "title": "v1" }).await.unwrap();
    let id = task.id().unwrap().to_string();

    // Swap in the caching decorator over the same store for the read side.
    tasks.set_backend(Arc::new(CachedBackend::with_ttl(
        raw.clone(),
        Duration::from_millis(50),
    )));

    let seen = tasks.require(&id).await.unwrap();
    assert_eq!(seen.get("title"), Some(Bson::String("v1".into())));

    // Writes pass straight through and do not invalidate the cache.
    task.set("title", "v2").unwrap();
    task.save().await.unwrap();

    let stale = tasks.require(&id).await.unwrap();
    assert_eq!(stale.get("title"), Some(Bson::String("v1".into())));

    tokio::time::sleep(Duration::from_millis(70)).await;

    let fresh = tasks.require(&id).await.unwrap();
    assert_eq!(fresh.get("title"), Some(Bson::String("v2".into())));
}

#[tokio::test]
async fn a_destroyed_record_lingers_until_the_ttl_expires() {
    let raw = MemoryBackend::new(&BackendConfig::new("Tasks"));
    let tasks = collection_with(Arc::new(raw.clone()));

    let task = tasks.create(doc! { "title": "t" }).await.unwrap();
    let id = task.id().unwrap().to_string();

    tasks.set_backend(Arc::new(CachedBackend::with_ttl(
        raw.clone(),
        Duration::from_millis(50),
    )));

    assert!(tasks.contains(&id).await.unwrap());
    task.destroy().await.unwrap();

    // Stale presence inside the window is the documented tradeoff.
    assert!(tasks.contains(&id).await.unwrap());

    tokio::time::sleep(Duration::from_millis(70)).await;
    assert!(!tasks.contains(&id).await.unwrap());
}

/// A backend whose candidate ids follow a script, for exercising the
/// collection's allocation loop against collisions.
#[derive(Debug)]
struct ScriptedIds {
    inner: MemoryBackend,
    // Popped back-to-front.
    ids: Mutex<Vec<String>>,
}

#[async_trait]
impl Backend for ScriptedIds {
    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    fn id_field(&self) -> &str {
        self.inner.id_field()
    }

    async fn make_id(&self, model: &Model) -> ModelMapResult<String> {
        let scripted = self.ids.lock().unwrap().pop();
        match scripted {
            Some(id) => Ok(id),
            None => self.inner.make_id(model).await,
        }
    }

    async fn save_model(&self, model: &Model) -> ModelMapResult<String> {
        self.inner.save_model(model).await
    }

    async fn get_item(&self, id: &str) -> ModelMapResult<Option<Document>> {
        self.inner.get_item(id).await
    }

    async fn delete(&self, model: &Model) -> ModelMapResult<()> {
        self.inner.delete(model).await
    }

    async fn len(&self) -> ModelMapResult<usize> {
        self.inner.len().await
    }

    async fn iter(&self) -> ModelMapResult<RecordStream> {
        self.inner.iter().await
    }

    async fn find(&self, query: Document, limit: Option<usize>) -> ModelMapResult<RecordStream> {
        self.inner.find(query, limit).await
    }
}

#[tokio::test]
async fn id_allocation_skips_colliding_candidates() {
    let scripted = ScriptedIds {
        inner: MemoryBackend::new(&BackendConfig::new("Tasks")),
        ids: Mutex::new(vec![
            "fresh-candidate".to_string(),
            "taken".to_string(),
            "taken".to_string(),
        ]),
    };
    let tasks = collection_with(Arc::new(scripted));

    // Seed the collision target with an explicit id.
    let mut seeded = Model::new(&TASK, doc! { "id": "taken", "title": "seed" });
    tasks.add(&mut seeded).await.unwrap();

    let task = tasks.create(doc! { "title": "new" }).await.unwrap();
    assert_eq!(task.id(), Some("fresh-candidate"));
    assert_eq!(tasks.count().await.unwrap(), 2);
}
