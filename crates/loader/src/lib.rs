//! # Apidex Loader
//!
//! The extractor-facing boundary: reads per-library record files
//! (`<name>[_<version>].json`, a flat JSON array of records), stamps
//! `_id` and `_library` onto every record, writes them into the
//! library's collection, and adds one overview record to the shared
//! libraries collection. Loading is the only way documents are created;
//! everything after this point mutates them in place.

mod error;

pub use error::{LoaderError, Result};

use apidex_model::{build_id, ApiDoc, LibraryId};
use apidex_store::{BulkWriter, DocStore, LIBRARY_COLLECTION};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Derive the library identity from a record file's name.
///
/// `acme_1.0.json` -> acme/1.0; `acme.json` -> acme/0. More than one
/// `_` separator is a naming error.
pub fn library_from_file_name(language: &str, path: &Path) -> Result<LibraryId> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LoaderError::BadFileName(path.display().to_string()))?;
    let mut parts = stem.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) if !name.is_empty() => {
            Ok(LibraryId::new(language, name, "0"))
        }
        (Some(name), Some(version), None) if !name.is_empty() && !version.is_empty() => {
            Ok(LibraryId::new(language, name, version))
        }
        _ => Err(LoaderError::BadFileName(stem.to_string())),
    }
}

/// Load one record file into the store.
pub fn load_file(store: &dyn DocStore, language: &str, path: &Path) -> Result<LibraryId> {
    let library = library_from_file_name(language, path)?;
    log::info!("Loading {} from {}", library.id, path.display());
    let records: Vec<Value> = serde_json::from_str(&fs::read_to_string(path)?)?;
    load_records(store, &library, records)?;
    Ok(library)
}

/// Recursively load every `*.json` file under a directory. Files are
/// loaded in path order for deterministic results.
pub fn load_dir(store: &dyn DocStore, language: &str, dir: &Path) -> Result<Vec<LibraryId>> {
    let mut paths: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut libraries = Vec::with_capacity(paths.len());
    for path in &paths {
        libraries.push(load_file(store, language, path)?);
    }
    Ok(libraries)
}

/// Stamp and persist one library's raw records, then write its
/// overview record. A record missing `metaType` or its qualified name
/// is a configuration error and fails the whole load before any
/// overview is written.
pub fn load_records(
    store: &dyn DocStore,
    library: &LibraryId,
    records: Vec<Value>,
) -> Result<()> {
    let mut writer = BulkWriter::new(store, library.id.clone());
    let mut packages: Vec<Value> = Vec::new();

    for record in records {
        let mut doc = ApiDoc::from_value(record)?;
        let id = build_id(&library.id, &doc)
            .ok_or_else(|| LoaderError::MissingIdentity(format!("{:?} {:?}", doc.meta_type, doc.name)))?;
        if doc.meta_type.is_package() {
            packages.push(json!({
                "_id": &id,
                "name": doc.name,
                "metaType": doc.meta_type,
                "firstSentenceSummary": doc.extra.get("firstSentenceSummary")
                    .cloned()
                    .unwrap_or(Value::Null),
            }));
        }
        doc.id = Some(id);
        doc.library = Some(library.clone());
        writer.insert(serde_json::to_value(&doc)?)?;
    }
    writer.flush()?;

    store.save(
        LIBRARY_COLLECTION,
        json!({
            "_id": &library.id,
            "language": &library.language,
            "name": &library.name,
            "version": &library.version,
            "metaType": "library",
            "packages": packages,
        }),
    )?;
    Ok(())
}
