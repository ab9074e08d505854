use crate::error::Result;
use crate::filter::Filter;
use crate::store::{doc_id, DocStore, Visitor};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// Persistent backend: one JSON file per collection under a root
/// directory, hydrated into memory on open.
///
/// Mutations mark the owning collection dirty; [`FileStore::persist`]
/// writes dirty collections back via temp-file + rename, and `Drop`
/// persists best-effort. A crash before persist loses unflushed writes,
/// which is acceptable because every build operation is idempotently
/// re-runnable. Filter semantics are identical to the in-memory backend.
pub struct FileStore {
    root: PathBuf,
    name: String,
    collections: RwLock<Collections>,
    dirty: Mutex<BTreeSet<String>>,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let mut collections = Collections::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(encoded) = file_name.strip_suffix(".json") else {
                continue;
            };
            let collection = decode_collection_name(encoded);
            let text = fs::read_to_string(entry.path())?;
            let docs: BTreeMap<String, Value> = serde_json::from_str(&text)?;
            collections.insert(collection, docs);
        }

        log::info!(
            "Opened file store at {} ({} collections)",
            root.display(),
            collections.len()
        );

        Ok(FileStore {
            name: format!("file:{}", root.display()),
            root,
            collections: RwLock::new(collections),
            dirty: Mutex::new(BTreeSet::new()),
        })
    }

    /// Write every dirty collection to disk.
    pub fn persist(&self) -> Result<()> {
        let dirty: Vec<String> = {
            let mut dirty = self.dirty.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *dirty).into_iter().collect()
        };
        let collections = self.lock_read();
        for collection in dirty {
            let path = self.collection_path(&collection);
            match collections.get(&collection) {
                Some(docs) => {
                    let tmp = path.with_extension("json.tmp");
                    fs::write(&tmp, serde_json::to_string(docs)?)?;
                    fs::rename(&tmp, &path)?;
                }
                None => {
                    if path.exists() {
                        fs::remove_file(&path)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", encode_collection_name(collection)))
    }

    fn mark_dirty(&self, collection: &str) {
        self.dirty
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string());
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, Collections> {
        self.collections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, Collections> {
        self.collections.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.persist() {
            log::error!("Failed to persist file store on drop: {e}");
        }
    }
}

impl DocStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn save(&self, collection: &str, doc: Value) -> Result<()> {
        let id = doc_id(collection, &doc)?;
        self.lock_write()
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc);
        self.mark_dirty(collection);
        Ok(())
    }

    fn save_all(&self, collection: &str, docs: Vec<Value>) -> Result<()> {
        // Validate the whole batch first: a bad document fails fast
        // without a partial write.
        let mut staged = Vec::with_capacity(docs.len());
        for doc in docs {
            staged.push((doc_id(collection, &doc)?, doc));
        }
        let mut collections = self.lock_write();
        let target = collections.entry(collection.to_string()).or_default();
        for (id, doc) in staged {
            target.insert(id, doc);
        }
        drop(collections);
        self.mark_dirty(collection);
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
        self.mark_dirty(collection);
    }

    fn drop_all(&self) {
        let names: Vec<String> = self.lock_read().keys().cloned().collect();
        self.lock_write().clear();
        for name in names {
            self.mark_dirty(&name);
        }
    }

    fn remove(&self, collection: &str, filter: &Filter) -> Result<usize> {
        let mut collections = self.lock_write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !filter.matches(doc));
        let removed = before - docs.len();
        drop(collections);
        if removed > 0 {
            self.mark_dirty(collection);
        }
        Ok(removed)
    }

    fn collection_names(&self) -> Vec<String> {
        self.lock_read().keys().cloned().collect()
    }
}

/// Collection names contain `/` and other path-hostile characters;
/// percent-encode everything outside `[A-Za-z0-9._-]`.
fn encode_collection_name(collection: &str) -> String {
    let mut out = String::with_capacity(collection.len());
    for byte in collection.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn decode_collection_name(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            if let Some(byte) = encoded
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn collection_name_encoding_round_trips() {
        for name in ["/java/acme/1.0", "/q/java/qn", "libraries", "/java/autoCompleteIndex"] {
            assert_eq!(decode_collection_name(&encode_collection_name(name)), name);
        }
        assert_eq!(encode_collection_name("/q/java/qn"), "%2Fq%2Fjava%2Fqn");
    }

    #[test]
    fn documents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store
                .save("/java/acme/1.0", json!({"_id": "/java/acme/1.0/com.acme.Foo", "metaType": "class"}))
                .unwrap();
            store.persist().unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        let doc = store.read("/java/acme/1.0", "/java/acme/1.0/com.acme.Foo");
        assert!(doc.is_some());
        assert_eq!(store.collection_names(), vec!["/java/acme/1.0".to_string()]);
    }

    #[test]
    fn drop_collection_deletes_file_on_persist() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.save("c", json!({"_id": "c/x"})).unwrap();
            store.persist().unwrap();
            store.drop_collection("c");
            store.persist().unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.collection_names().is_empty());
    }

    #[test]
    fn filter_semantics_match_memory_backend() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store
            .save("c", json!({"_id": "c/a", "_searchName": "demo.app", "_library": {"name": "acme"}}))
            .unwrap();
        store
            .save("c", json!({"_id": "c/b", "_searchName": "other", "_library": {"name": "acme"}}))
            .unwrap();

        let hits = store.find("c", &Filter::new().regex("_searchName", "^demo").unwrap());
        assert_eq!(hits.len(), 1);
        let hits = store.find("c", &Filter::new().eq("_library.name", "acme"));
        assert_eq!(hits.len(), 2);
        assert_eq!(
            store.remove("c", &Filter::new().eq("_searchName", "other")).unwrap(),
            1
        );
    }
}
