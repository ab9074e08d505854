use crate::error::Result;
use apidex_model::{qualified_signature, simple_signature, ApiDoc, LibraryId, MetaType};
use apidex_store::{BulkWriter, DocStore, Filter, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One reference-name entry: maps a symbolic name to the document it
/// names. The same document may own several entries (methods get three,
/// one per signature rendering).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefEntry {
    #[serde(rename = "_id")]
    pub id: String,
    /// The symbolic name queried against.
    #[serde(rename = "_qn")]
    pub reference_name: String,
    /// Back-pointer to the source document's `_id`.
    #[serde(rename = "id")]
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<MetaType>,
    #[serde(rename = "_library")]
    pub library: LibraryId,
}

/// The resolution backbone: maps every symbolic reference name to the
/// matching records across all libraries and versions of one language.
///
/// Reference names: qualified name for types and packages;
/// `ContainingClass+member` for members (`+` substitutes for the `#`
/// unsafe in path-style identifiers); methods and constructors
/// additionally get signature-qualified entries
/// (`Class+name(a.b.C)` and `Class+name(C)`).
pub struct ReferenceNameIndex {
    language: String,
    collection: String,
}

impl ReferenceNameIndex {
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        ReferenceNameIndex {
            collection: format!("/q/{language}/qn"),
            language,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Every entry matching the reference name, across all libraries.
    pub fn query(&self, store: &dyn DocStore, reference_name: &str) -> Vec<RefEntry> {
        store
            .find(&self.collection, &Filter::new().eq("_qn", reference_name))
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping malformed reference entry: {e}");
                    None
                }
            })
            .collect()
    }

    /// The best single match: an entry from `library_id` if one exists,
    /// else the newest library version (ties broken by library id, so
    /// the fallback is deterministic regardless of backend).
    pub fn query_one(
        &self,
        store: &dyn DocStore,
        reference_name: &str,
        library_id: &str,
    ) -> Option<RefEntry> {
        let mut entries = self.query(store, reference_name);
        if let Some(local) = entries.iter().find(|e| e.library.id == library_id) {
            return Some(local.clone());
        }
        entries.sort_by(|a, b| {
            b.library
                .compare_version(&a.library)
                .then_with(|| a.library.id.cmp(&b.library.id))
        });
        entries.into_iter().next()
    }

    /// Resolve a reference name straight to its source document.
    pub fn resolve(
        &self,
        store: &dyn DocStore,
        reference_name: &str,
        library_id: &str,
    ) -> Option<Value> {
        let entry = self.query_one(store, reference_name, library_id)?;
        store.read_id(&entry.doc_id)
    }

    /// Drop and rebuild the whole index from every library of this
    /// language.
    pub fn build_index(&self, store: &dyn DocStore) -> Result<()> {
        log::info!("Building reference name index {}", self.collection);
        store.drop_collection(&self.collection);
        store.create_index(&self.collection, &[("_qn", 1)]);
        self.add_libraries(store, &store.get_library_ids(&self.language))
    }

    /// Insert only the named library's entries (additive).
    pub fn add_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        log::debug!("Adding {library_id} to {}", self.collection);
        let mut builder = Builder {
            writer: BulkWriter::new(store, self.collection.clone()),
        };
        store.for_all_in(library_id, &mut builder)?;
        Ok(())
    }

    pub fn add_libraries(&self, store: &dyn DocStore, library_ids: &[String]) -> Result<()> {
        for library_id in library_ids {
            self.add_library(store, library_id)?;
        }
        Ok(())
    }

    pub fn remove_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        let removed = store.remove(
            &self.collection,
            &Filter::new().eq("_library._id", library_id),
        )?;
        log::info!("Removed {removed} reference entries for {library_id}");
        Ok(())
    }
}

struct Builder<'a> {
    writer: BulkWriter<'a>,
}

impl Visitor for Builder<'_> {
    fn call(&mut self, _collection: &str, value: &Value) -> apidex_store::Result<()> {
        let doc = match ApiDoc::from_value(value.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Skipping unparseable document: {e}");
                return Ok(());
            }
        };
        let (Some(doc_id), Some(library)) = (doc.id.clone(), doc.library.clone()) else {
            return Ok(());
        };
        for reference_name in reference_names(&doc) {
            let entry = RefEntry {
                id: format!("{reference_name}/{doc_id}"),
                reference_name,
                doc_id: doc_id.clone(),
                qualified_name: doc.qualified().map(str::to_string),
                meta_type: Some(doc.meta_type),
                library: library.clone(),
            };
            match serde_json::to_value(&entry) {
                Ok(value) => self.writer.safe_insert(value),
                Err(e) => log::error!("Dropped reference entry for {doc_id}: {e}"),
            }
        }
        Ok(())
    }

    fn after(&mut self, _collection: &str) -> apidex_store::Result<()> {
        self.writer.flush()
    }
}

/// The reference names a document is findable under.
pub fn reference_names(doc: &ApiDoc) -> Vec<String> {
    let Some(qualified) = doc.qualified() else {
        return Vec::new();
    };
    if doc.meta_type.is_package() || doc.meta_type.is_type() {
        return vec![qualified.to_string()];
    }
    if !doc.meta_type.is_member() {
        return Vec::new();
    }

    let Some(name) = doc.name.as_deref() else {
        return Vec::new();
    };
    let containing = doc
        .containing_class
        .as_ref()
        .and_then(|c| c.qualified())
        .or_else(|| qualified.rsplit_once('.').map(|(head, _)| head));
    let Some(containing) = containing else {
        return Vec::new();
    };

    let base = format!("{containing}+{name}");
    if doc.meta_type.is_callable() {
        vec![
            base.clone(),
            format!("{base}{}", qualified_signature(&doc.parameters)),
            format!("{base}{}", simple_signature(&doc.parameters)),
        ]
    } else {
        vec![base]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidex_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seed_library(store: &MemoryStore, library_id: &str) {
        let lib = LibraryId::parse(library_id).unwrap();
        store
            .save(
                apidex_store::LIBRARY_COLLECTION,
                json!({"_id": &lib.id, "name": &lib.name, "version": &lib.version,
                       "language": &lib.language, "metaType": "library"}),
            )
            .unwrap();
        store
            .save_all(
                library_id,
                vec![
                    json!({"_id": format!("{library_id}/com.acme"), "metaType": "package",
                           "name": "com.acme", "_library": &lib}),
                    json!({"_id": format!("{library_id}/com.acme.Foo"), "metaType": "class",
                           "name": "Foo", "qualifiedName": "com.acme.Foo", "_library": &lib}),
                    json!({"_id": format!("{library_id}/com.acme.Foo.parse(java.lang.String)"),
                           "metaType": "method", "name": "parse",
                           "qualifiedName": "com.acme.Foo.parse",
                           "parameters": [{"type": {"typeName": "String",
                                                    "qualifiedTypeName": "java.lang.String"}}],
                           "_library": &lib}),
                ],
            )
            .unwrap();
    }

    #[test]
    fn methods_get_three_reference_names() {
        let doc = ApiDoc::from_value(json!({
            "metaType": "method",
            "name": "parse",
            "qualifiedName": "com.acme.Foo.parse",
            "parameters": [{"type": {"typeName": "String",
                                     "qualifiedTypeName": "java.lang.String"}}],
        }))
        .unwrap();
        assert_eq!(
            reference_names(&doc),
            vec![
                "com.acme.Foo+parse".to_string(),
                "com.acme.Foo+parse(java.lang.String)".to_string(),
                "com.acme.Foo+parse(String)".to_string(),
            ]
        );
    }

    #[test]
    fn fields_get_one_reference_name() {
        let doc = ApiDoc::from_value(json!({
            "metaType": "field",
            "name": "COUNT",
            "qualifiedName": "com.acme.Foo.COUNT",
        }))
        .unwrap();
        assert_eq!(reference_names(&doc), vec!["com.acme.Foo+COUNT".to_string()]);
    }

    #[test]
    fn build_and_query() {
        let store = MemoryStore::new();
        seed_library(&store, "/java/acme/1.0");

        let index = ReferenceNameIndex::new("java");
        index.build_index(&store).unwrap();

        let hits = index.query(&store, "com.acme.Foo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "/java/acme/1.0/com.acme.Foo");

        // Signature-qualified method lookups resolve too.
        assert_eq!(index.query(&store, "com.acme.Foo+parse").len(), 1);
        assert_eq!(
            index.query(&store, "com.acme.Foo+parse(java.lang.String)").len(),
            1
        );
        assert_eq!(index.query(&store, "com.acme.Foo+parse(String)").len(), 1);
        assert!(index.query(&store, "com.acme.Missing").is_empty());
    }

    #[test]
    fn query_one_prefers_the_callers_library_then_newest() {
        let store = MemoryStore::new();
        seed_library(&store, "/java/acme/1.0");
        seed_library(&store, "/java/acme/2.0");
        seed_library(&store, "/java/other/5.0");

        let index = ReferenceNameIndex::new("java");
        index.build_index(&store).unwrap();

        let hit = index
            .query_one(&store, "com.acme.Foo", "/java/acme/1.0")
            .unwrap();
        assert_eq!(hit.library.id, "/java/acme/1.0");

        // No same-library match: deterministic fallback picks the newest
        // version.
        let hit = index
            .query_one(&store, "com.acme.Foo", "/java/elsewhere/1.0")
            .unwrap();
        assert_eq!(hit.library.id, "/java/acme/2.0");
    }

    #[test]
    fn remove_library_leaves_other_libraries_intact() {
        let store = MemoryStore::new();
        seed_library(&store, "/java/acme/1.0");
        seed_library(&store, "/java/acme/2.0");

        let index = ReferenceNameIndex::new("java");
        index.build_index(&store).unwrap();
        index.remove_library(&store, "/java/acme/1.0").unwrap();

        let hits = index.query(&store, "com.acme.Foo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].library.id, "/java/acme/2.0");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let store = MemoryStore::new();
        seed_library(&store, "/java/acme/1.0");

        let index = ReferenceNameIndex::new("java");
        index.build_index(&store).unwrap();
        let first: Vec<String> = index
            .query(&store, "com.acme.Foo+parse")
            .into_iter()
            .map(|e| e.id)
            .collect();
        index.build_index(&store).unwrap();
        let second: Vec<String> = index
            .query(&store, "com.acme.Foo+parse")
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(first, second);
    }
}
