//! End-to-end model lifecycle against the in-memory backend.

use std::{sync::Arc, time::Duration};

use bson::{Bson, doc};
use modelmap::{memory::MemoryBackend, prelude::*, time};

fn initials(model: &Model) -> Bson {
    let initials: String = model
        .stored("title")
        .and_then(Bson::as_str)
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect();
    Bson::String(initials)
}

static TASK: SchemaDescriptor = SchemaDescriptor {
    name: "Task",
    parent: Some(&BASE),
    fields: &["title"],
    computed: &[("initials", initials)],
};

static NOTE: SchemaDescriptor = SchemaDescriptor {
    name: "Note",
    parent: Some(&BASE),
    fields: &["body"],
    computed: &[],
};

fn task_collection() -> Collection {
    let tasks = Collection::new(CollectionConfig::new("Tasks", &TASK));
    tasks.set_backend(Arc::new(MemoryBackend::new(&BackendConfig::new("Tasks"))));
    tasks
}

#[tokio::test]
async fn first_save_populates_the_lifecycle_fields() {
    let tasks = task_collection();

    let unsaved = Model::new(&TASK, doc! { "title": "buy milk" });
    assert!(unsaved.is_new());
    assert_eq!(unsaved.id(), None);

    let task = tasks.create(doc! { "title": "buy milk" }).await.unwrap();
    assert!(!task.is_new());
    assert!(task.id().is_some());
    assert_eq!(task.get("class"), Some(Bson::String("Task".into())));
    assert_eq!(task.get("title"), Some(Bson::String("buy milk".into())));

    // Both timestamps are valid UTC strings with the trailing designator.
    for field in [CREATED_FIELD, MODIFIED_FIELD] {
        let stamp = task.get(field).unwrap();
        time::parse_iso(stamp.as_str().unwrap()).unwrap();
    }

    let data = task.to_data(false);
    assert_eq!(data.len(), 5);
    for key in ["id", "created", "modified", "class", "title"] {
        assert!(data.contains_key(key), "missing {key}");
    }
}

#[tokio::test]
async fn saving_again_refreshes_only_the_modification_stamp() {
    let tasks = task_collection();
    let mut task = tasks.create(doc! { "title": "t" }).await.unwrap();

    let id = task.id().unwrap().to_string();
    let created = task.get("created");
    let class = task.get("class");
    let modified = task.get("modified");

    tokio::time::sleep(Duration::from_millis(5)).await;
    task.save().await.unwrap();

    assert_eq!(task.id(), Some(id.as_str()));
    assert_eq!(task.get("created"), created);
    assert_eq!(task.get("class"), class);
    assert_ne!(task.get("modified"), modified);
}

#[tokio::test]
async fn projection_round_trips_through_reconstruction() {
    let tasks = task_collection();
    let task = tasks.create(doc! { "title": "water the plants" }).await.unwrap();

    let copy = tasks.model_from_data(task.to_data(false));

    assert_eq!(copy.to_data(false), task.to_data(false));
    assert_eq!(copy.get("initials"), Some(Bson::String("wtp".into())));

    // The computed output is recomputed against current state, not carried over.
    let mut copy = copy;
    copy.set("title", "feed the cat").unwrap();
    assert_eq!(copy.get("initials"), Some(Bson::String("ftc".into())));
}

#[tokio::test]
async fn adding_an_existing_id_fails_without_writing() {
    let tasks = task_collection();
    let task = tasks.create(doc! { "title": "original" }).await.unwrap();
    let id = task.id().unwrap().to_string();

    let mut dup = Model::new(&TASK, doc! { "id": id.as_str(), "title": "impostor" });
    let err = tasks.add(&mut dup).await.unwrap_err();
    assert!(matches!(err, ModelMapError::DuplicateId(dup_id, _) if dup_id == id));

    assert_eq!(tasks.count().await.unwrap(), 1);
    let stored = tasks.require(&id).await.unwrap();
    assert_eq!(stored.get("title"), Some(Bson::String("original".into())));
}

#[tokio::test]
async fn missing_ids_are_a_default_not_an_error() {
    let tasks = task_collection();

    let missing = tasks.get("never-stored").await.unwrap();
    assert!(missing.is_none());

    let fallback = missing
        .map(|model| model.get_or("title", "none"))
        .unwrap_or_else(|| Bson::String("none".into()));
    assert_eq!(fallback, Bson::String("none".into()));

    assert!(!tasks.contains("never-stored").await.unwrap());

    let err = tasks.require("never-stored").await.unwrap_err();
    assert!(matches!(err, ModelMapError::NotFound(id, _) if id == "never-stored"));
}

#[tokio::test]
async fn fetch_reloads_fields_from_storage() {
    let tasks = task_collection();
    let mut task = tasks.create(doc! { "title": "stored" }).await.unwrap();

    task.set("title", "unsaved edit").unwrap();
    let title = task.fetch().await.unwrap().get("title");
    assert_eq!(title, Some(Bson::String("stored".into())));
}

#[tokio::test]
async fn destroy_severs_the_backend_record() {
    let tasks = task_collection();
    let task = tasks.create(doc! { "title": "doomed" }).await.unwrap();
    let id = task.id().unwrap().to_string();

    task.destroy().await.unwrap();

    assert!(!tasks.contains(&id).await.unwrap());
    assert_eq!(tasks.count().await.unwrap(), 0);
}

#[tokio::test]
async fn unregistered_model_types_cannot_be_saved() {
    let tasks = task_collection();

    let mut note = Model::new(&NOTE, doc! { "body": "b" });
    let err = tasks.add(&mut note).await.unwrap_err();
    assert!(matches!(err, ModelMapError::UnregisteredClass(class, _) if class == "Note"));

    assert_eq!(tasks.count().await.unwrap(), 0);
}

#[tokio::test]
async fn allocated_ids_avoid_every_existing_id() {
    let tasks = task_collection();
    let mut existing = Vec::new();
    for _ in 0..5 {
        let task = tasks.create(doc! { "title": "t" }).await.unwrap();
        existing.push(task.id().unwrap().to_string());
    }

    let probe = Model::new(&TASK, doc! {});
    for _ in 0..20 {
        let candidate = tasks.make_id(&probe).await.unwrap();
        assert!(!existing.contains(&candidate));
    }
}

#[tokio::test]
async fn the_registry_hands_out_one_collection_per_name() {
    let registry = Registry::new();
    let first = registry.collection(CollectionConfig::new("Tasks", &TASK));
    first.set_backend(Arc::new(MemoryBackend::new(&BackendConfig::new("Tasks"))));

    let second = registry.collection(CollectionConfig::new("Tasks", &TASK));
    // The second handle sees the backend attached through the first.
    second.backend().unwrap();

    let task = second.create(doc! { "title": "shared" }).await.unwrap();
    assert!(first.contains(task.id().unwrap()).await.unwrap());
}
