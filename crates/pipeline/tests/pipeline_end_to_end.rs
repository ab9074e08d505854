//! Full-pipeline scenario: load a small library, run every stage, and
//! check the resolved graph from the outside.

use apidex_index::{KnownSubclassesIndex, ReferenceNameIndex};
use apidex_model::LibraryId;
use apidex_pipeline::{tasks, PostProcessor};
use apidex_store::{DocStore, MemoryStore, LIBRARY_COLLECTION};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const LIB: &str = "/java/acme/1.0";

fn seed(store: &MemoryStore) {
    let lib = LibraryId::parse(LIB).unwrap();
    store
        .save(
            LIBRARY_COLLECTION,
            json!({"_id": &lib.id, "name": &lib.name, "version": &lib.version,
                   "language": &lib.language, "metaType": "library"}),
        )
        .unwrap();
    store
        .save_all(
            LIB,
            vec![
                json!({"_id": format!("{LIB}/com.acme.Base"), "metaType": "class",
                       "name": "Base", "qualifiedName": "com.acme.Base",
                       "methods": [{"metaType": "method", "name": "m",
                                    "qualifiedName": "com.acme.Base.m"}],
                       "_library": &lib}),
                json!({"_id": format!("{LIB}/com.acme.Base.m()"), "metaType": "method",
                       "name": "m", "qualifiedName": "com.acme.Base.m",
                       "containingClass": {"qualifiedName": "com.acme.Base"},
                       "_library": &lib}),
                json!({"_id": format!("{LIB}/com.acme.Sub"), "metaType": "class",
                       "name": "Sub", "qualifiedName": "com.acme.Sub",
                       "superclass": {"qualifiedTypeName": "com.acme.Base"},
                       "allSuperclassTypes": [{"qualifiedTypeName": "com.acme.Base"}],
                       "_library": &lib}),
            ],
        )
        .unwrap();
}

fn run_pipeline(store: &MemoryStore) {
    ReferenceNameIndex::new("java").build_index(store).unwrap();
    PostProcessor::new("java").run(store, LIB).unwrap();
}

fn read(store: &MemoryStore, relative: &str) -> Value {
    store.read(LIB, &format!("{LIB}/{relative}")).unwrap()
}

#[test]
fn sub_inherits_base_method() {
    let store = MemoryStore::new();
    seed(&store);
    run_pipeline(&store);

    let sub = read(&store, "com.acme.Sub");
    let segments = sub["_inherited"].as_array().unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(
        segments[0]["superclass"]["qualifiedTypeName"],
        "com.acme.Base"
    );
    assert_eq!(segments[0]["methods"].as_array().unwrap().len(), 1);
    assert_eq!(segments[0]["methods"][0]["name"], "m");

    assert_eq!(
        sub["_superclasses"][0]["qualifiedTypeName"],
        "com.acme.Base"
    );

    // No override anywhere: Sub declares nothing.
    let base_method = read(&store, "com.acme.Base.m()");
    assert!(base_method.get("_overrides").is_none());
    assert!(read(&store, "com.acme.Base").get("_overrides").is_none());
}

#[test]
fn pipeline_is_idempotent() {
    let store = MemoryStore::new();
    seed(&store);
    run_pipeline(&store);

    let first_sub = read(&store, "com.acme.Sub");
    let first_method = read(&store, "com.acme.Base.m()");

    // Second full run, including an index rebuild, changes nothing.
    run_pipeline(&store);
    assert_eq!(read(&store, "com.acme.Sub"), first_sub);
    assert_eq!(read(&store, "com.acme.Base.m()"), first_method);
}

#[test]
fn add_library_task_wires_everything() {
    let store = MemoryStore::new();
    seed(&store);
    tasks::add_library(&store, LIB).unwrap();

    // Pipeline results are in place.
    assert!(read(&store, "com.acme.Sub").get("_inherited").is_some());

    // Derived indexes answer queries.
    let subclasses = KnownSubclassesIndex::new("java");
    let hits = subclasses.query_subclasses(&store, "com.acme.Base");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["qualifiedName"], "com.acme.Sub");

    // And removal undoes the wiring.
    let report = tasks::remove_library(&store, LIB).unwrap();
    assert_eq!(report.failed, 0);
    assert!(subclasses.query_subclasses(&store, "com.acme.Base").is_empty());
    assert!(store.get_library(LIB).is_none());
}
