//! The in-memory and file backends must be interchangeable behind the
//! `DocStore` trait: identical query, removal, and library-helper
//! behavior regardless of which one the pipeline runs against.

use apidex_store::{DocStore, FileStore, Filter, MemoryStore, LIBRARY_COLLECTION};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn seed(store: &dyn DocStore) {
    store
        .save(
            LIBRARY_COLLECTION,
            json!({
                "_id": "/java/acme/1.0",
                "name": "acme",
                "version": "1.0",
                "language": "java",
                "metaType": "library"
            }),
        )
        .unwrap();
    store
        .save(
            LIBRARY_COLLECTION,
            json!({
                "_id": "/java/acme/2.0",
                "name": "acme",
                "version": "2.0",
                "language": "java",
                "metaType": "library"
            }),
        )
        .unwrap();
    store
        .save_all(
            "/java/acme/1.0",
            vec![
                json!({"_id": "/java/acme/1.0/com.acme.Foo", "metaType": "class", "qualifiedName": "com.acme.Foo"}),
                json!({"_id": "/java/acme/1.0/com.acme.Bar", "metaType": "interface", "qualifiedName": "com.acme.Bar"}),
                json!({"_id": "/java/acme/1.0/com.acme", "metaType": "package", "name": "com.acme"}),
            ],
        )
        .unwrap();
}

fn exercise(store: &dyn DocStore) {
    let classes = store.find("/java/acme/1.0", &Filter::new().eq("metaType", "class"));
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0]["qualifiedName"], "com.acme.Foo");

    let prefixed = store.find(
        "/java/acme/1.0",
        &Filter::new().prefix("qualifiedName", "com.acme.").unwrap(),
    );
    assert_eq!(prefixed.len(), 2);

    let versions = store.get_library_versions("java", "acme");
    assert_eq!(versions.len(), 2);

    let removed = store
        .remove("/java/acme/1.0", &Filter::new().eq("metaType", "package"))
        .unwrap();
    assert_eq!(removed, 1);
    assert!(store.read("/java/acme/1.0", "/java/acme/1.0/com.acme").is_none());

    store.drop_collection("/java/acme/1.0");
    assert!(store
        .find("/java/acme/1.0", &Filter::new())
        .is_empty());
}

#[test]
fn memory_backend() {
    let store = MemoryStore::new();
    seed(&store);
    exercise(&store);
}

#[test]
fn file_backend() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    seed(&store);
    exercise(&store);
}

#[test]
fn file_backend_queries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = FileStore::open(dir.path()).unwrap();
        seed(&store);
        store.persist().unwrap();
    }
    let store = FileStore::open(dir.path()).unwrap();
    exercise(&store);
}
