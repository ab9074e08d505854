use crate::error::{Result, StoreError};
use crate::filter::Filter;
use serde_json::{json, Value};

/// Collection holding one overview record per library.
pub const LIBRARY_COLLECTION: &str = "libraries";

/// Streaming callback for [`DocStore::for_all`].
///
/// `before`/`after` fire once per collection so a caller can open and flush
/// a `BulkWriter` per collection rather than per document.
pub trait Visitor {
    fn before(&mut self, _collection: &str) -> Result<()> {
        Ok(())
    }

    fn call(&mut self, collection: &str, doc: &Value) -> Result<()>;

    fn after(&mut self, _collection: &str) -> Result<()> {
        Ok(())
    }
}

/// The document store contract shared by the in-memory and persistent
/// backends. Injected everywhere as `&dyn DocStore`; no ambient global
/// handle exists.
pub trait DocStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Upsert one document by its `_id`. Fails fast on an empty
    /// collection name or a missing/empty `_id` (configuration error; no
    /// partial write).
    fn save(&self, collection: &str, doc: Value) -> Result<()>;

    /// Upsert a batch; applied per document.
    fn save_all(&self, collection: &str, docs: Vec<Value>) -> Result<()> {
        for doc in docs {
            self.save(collection, doc)?;
        }
        Ok(())
    }

    fn read(&self, collection: &str, id: &str) -> Option<Value>;

    /// Read by full id; the collection is the id's prefix up to the last
    /// `/` separator.
    fn read_id(&self, id: &str) -> Option<Value> {
        self.read(collection_of_id(id), id)
    }

    fn find(&self, collection: &str, filter: &Filter) -> Vec<Value>;

    fn find_limit(&self, collection: &str, filter: &Filter, limit: usize) -> Vec<Value> {
        let mut results = self.find(collection, filter);
        results.truncate(limit);
        results
    }

    /// Stream every document in one collection through the visitor.
    /// Iterates a snapshot, so the visitor may save into any collection,
    /// including the one being streamed.
    fn for_all_in(&self, collection: &str, visitor: &mut dyn Visitor) -> Result<()>;

    /// Stream each named collection in turn.
    fn for_all(&self, collections: &[String], visitor: &mut dyn Visitor) -> Result<()> {
        for collection in collections {
            self.for_all_in(collection, visitor)?;
        }
        Ok(())
    }

    /// Secondary-index hint; backends may no-op.
    fn create_index(&self, _collection: &str, _keys: &[(&str, i32)]) {}

    fn drop_collection(&self, collection: &str);

    fn drop_all(&self);

    /// Delete all matches; returns the number removed.
    fn remove(&self, collection: &str, filter: &Filter) -> Result<usize>;

    fn collection_names(&self) -> Vec<String>;

    // ---- read-only library helpers consumed by the query layer ----

    fn get_library(&self, library_id: &str) -> Option<Value> {
        self.read(LIBRARY_COLLECTION, library_id)
    }

    fn get_library_list(&self, language: &str) -> Vec<Value> {
        self.find(LIBRARY_COLLECTION, &Filter::new().eq("language", language))
            .into_iter()
            .map(library_summary)
            .collect()
    }

    fn get_library_versions(&self, language: &str, name: &str) -> Vec<Value> {
        self.find(
            LIBRARY_COLLECTION,
            &Filter::new().eq("language", language).eq("name", name),
        )
        .into_iter()
        .map(library_summary)
        .collect()
    }

    /// Library ids, which are also collection names.
    fn get_library_ids(&self, language: &str) -> Vec<String> {
        self.find(LIBRARY_COLLECTION, &Filter::new().eq("language", language))
            .iter()
            .filter_map(|doc| doc.get("_id").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

/// The collection a full document id belongs to: everything before the
/// last `/` separator.
pub fn collection_of_id(id: &str) -> &str {
    id.rfind('/').map(|i| &id[..i]).unwrap_or("")
}

/// Extract a non-empty `_id`, or fail the save.
pub fn doc_id(collection: &str, doc: &Value) -> Result<String> {
    if collection.is_empty() {
        return Err(StoreError::EmptyCollection);
    }
    match doc.get("_id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(StoreError::MissingId(doc.to_string())),
    }
}

fn library_summary(doc: Value) -> Value {
    json!({
        "_id": doc.get("_id").cloned().unwrap_or(Value::Null),
        "name": doc.get("name").cloned().unwrap_or(Value::Null),
        "version": doc.get("version").cloned().unwrap_or(Value::Null),
        "language": doc.get("language").cloned().unwrap_or(Value::Null),
        "metaType": doc.get("metaType").cloned().unwrap_or(Value::Null),
    })
}
