use crate::error::Result;
use crate::filter::Filter;
use crate::store::{doc_id, DocStore, Visitor};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// In-memory backend: collection -> id -> document.
///
/// Ordered maps give deterministic scan order (documents stream in id
/// order), which keeps index builds and fallback query results stable
/// across runs. Safe for concurrent readers.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.collections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.collections.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn save(&self, collection: &str, doc: Value) -> Result<()> {
        let id = doc_id(collection, &doc)?;
        self.lock_write()
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc);
        Ok(())
    }

    fn read(&self, collection: &str, id: &str) -> Option<Value> {
        self.lock_read().get(collection)?.get(id).cloned()
    }

    fn find(&self, collection: &str, filter: &Filter) -> Vec<Value> {
        self.lock_read()
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn for_all_in(&self, collection: &str, visitor: &mut dyn Visitor) -> Result<()> {
        // Snapshot before iterating so the visitor may write back into
        // this collection without deadlocking on the store lock.
        let snapshot: Vec<Value> = self
            .lock_read()
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();

        visitor.before(collection)?;
        for doc in &snapshot {
            visitor.call(collection, doc)?;
        }
        visitor.after(collection)
    }

    fn drop_collection(&self, collection: &str) {
        self.lock_write().remove(collection);
    }

    fn drop_all(&self) {
        self.lock_write().clear();
    }

    fn remove(&self, collection: &str, filter: &Filter) -> Result<usize> {
        let mut collections = self.lock_write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !filter.matches(doc));
        Ok(before - docs.len())
    }

    fn collection_names(&self) -> Vec<String> {
        self.lock_read().keys().cloned().collect()
    }
}
