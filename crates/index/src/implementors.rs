use crate::custom::CustomIndex;
use crate::error::Result;
use crate::versioned;
use apidex_model::{ApiDoc, LibraryId, MetaType, TypeStub};
use apidex_store::{DocStore, Filter, Visitor};
use serde_json::Value;

/// Interface -> implementing classes index.
///
/// Only class-category documents count as implementors; an interface
/// extending another interface is a subinterface, not an implementor,
/// and lands in the known-subclasses index instead.
pub struct KnownImplementorsIndex {
    language: String,
    collection: String,
}

impl KnownImplementorsIndex {
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        KnownImplementorsIndex {
            collection: format!("/q/{language}/allKnownImplementors"),
            language,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn query_implementors(&self, store: &dyn DocStore, interface_qn: &str) -> Vec<Value> {
        store.find(&self.collection, &Filter::new().eq("_interface", interface_qn))
    }
}

impl CustomIndex for KnownImplementorsIndex {
    fn name(&self) -> &'static str {
        "allKnownImplementors"
    }

    fn build_index(&self, store: &dyn DocStore) -> Result<()> {
        log::info!("Building {}", self.collection);
        store.drop_collection(&self.collection);
        store.create_index(&self.collection, &[("_interface", 1)]);
        self.add_libraries(store, &store.get_library_ids(&self.language))
    }

    fn add_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        let library = LibraryId::parse(library_id)?;
        let mut builder = Builder {
            store,
            collection: &self.collection,
            library,
        };
        store.for_all_in(library_id, &mut builder)?;
        Ok(())
    }

    fn remove_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        let library = LibraryId::parse(library_id)?;
        let removed = versioned::remove_library(store, &self.collection, &library)?;
        log::info!("Removed {removed} implementor entries for {library_id}");
        Ok(())
    }

    fn query(&self, store: &dyn DocStore, key: &str) -> Vec<Value> {
        self.query_implementors(store, key)
    }
}

struct Builder<'a> {
    store: &'a dyn DocStore,
    collection: &'a str,
    library: LibraryId,
}

impl Visitor for Builder<'_> {
    fn call(&mut self, _collection: &str, value: &Value) -> apidex_store::Result<()> {
        let Ok(doc) = ApiDoc::from_value(value.clone()) else {
            return Ok(());
        };
        if !doc.meta_type.is_type() || doc.meta_type == MetaType::Interface {
            return Ok(());
        }
        // The extractor's full same-run set when present, else the
        // declared list.
        let interfaces: &[TypeStub] = if doc.all_interface_types.is_empty() {
            &doc.interfaces
        } else {
            &doc.all_interface_types
        };
        for interface_qn in interfaces.iter().filter_map(TypeStub::qualified) {
            if let Err(e) = versioned::upsert(
                self.store,
                self.collection,
                "_interface",
                interface_qn,
                &doc,
                &self.library,
            ) {
                log::error!("Dropped implementor entry for {:?}: {e}", doc.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidex_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seed(store: &MemoryStore, library_id: &str) {
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
                    json!({"_id": format!("{library_id}/com.acme.Impl"), "metaType": "class",
                           "name": "Impl", "qualifiedName": "com.acme.Impl",
                           "allInterfaceTypes": [
                               {"qualifiedTypeName": "com.acme.Api"},
                               {"qualifiedTypeName": "java.io.Closeable"},
                           ],
                           "_library": &lib}),
                    json!({"_id": format!("{library_id}/com.acme.Sub"), "metaType": "interface",
                           "name": "Sub", "qualifiedName": "com.acme.Sub",
                           "interfaces": [{"qualifiedTypeName": "com.acme.Api"}],
                           "_library": &lib}),
                ],
            )
            .unwrap();
    }

    #[test]
    fn classes_are_implementors_interfaces_are_not() {
        let store = MemoryStore::new();
        seed(&store, "/java/acme/1.0");

        let index = KnownImplementorsIndex::new("java");
        index.build_index(&store).unwrap();

        let hits = index.query_implementors(&store, "com.acme.Api");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["qualifiedName"], "com.acme.Impl");

        let hits = index.query_implementors(&store, "java.io.Closeable");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn removal_respects_other_libraries() {
        let store = MemoryStore::new();
        seed(&store, "/java/acme/1.0");
        seed(&store, "/java/other/1.0");

        let index = KnownImplementorsIndex::new("java");
        index.build_index(&store).unwrap();
        index.remove_library(&store, "/java/acme/1.0").unwrap();

        let hits = index.query_implementors(&store, "com.acme.Api");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["_library"]["name"], "other");
    }
}
