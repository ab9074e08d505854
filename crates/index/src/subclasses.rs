use crate::custom::CustomIndex;
use crate::error::Result;
use crate::versioned;
use apidex_model::{ApiDoc, LibraryId, MetaType};
use apidex_store::{DocStore, Filter, Visitor};
use serde_json::Value;

/// Universal root class; indexing it would put every class in one bucket.
const ROOT_CLASS: &str = "java.lang.Object";

/// Immediate-superclass -> subclasses index.
///
/// Only the immediate relation is indexed; deeper descendants are
/// reached by repeated queries. Interfaces contribute through their
/// declared `interfaces` list, since interface "extends" is modeled as
/// "implements" in the record shape.
pub struct KnownSubclassesIndex {
    language: String,
    collection: String,
}

impl KnownSubclassesIndex {
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        KnownSubclassesIndex {
            collection: format!("/q/{language}/allKnownSubclasses"),
            language,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Immediate subclasses (or subinterfaces) of the named type.
    pub fn query_subclasses(&self, store: &dyn DocStore, superclass_qn: &str) -> Vec<Value> {
        store.find(&self.collection, &Filter::new().eq("_superclass", superclass_qn))
    }
}

impl CustomIndex for KnownSubclassesIndex {
    fn name(&self) -> &'static str {
        "allKnownSubclasses"
    }

    fn build_index(&self, store: &dyn DocStore) -> Result<()> {
        log::info!("Building {}", self.collection);
        store.drop_collection(&self.collection);
        store.create_index(&self.collection, &[("_superclass", 1)]);
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
        log::info!("Removed {removed} subclass entries for {library_id}");
        Ok(())
    }

    fn query(&self, store: &dyn DocStore, key: &str) -> Vec<Value> {
        self.query_subclasses(store, key)
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
        if !doc.meta_type.is_type() {
            return Ok(());
        }
        for ancestor_qn in immediate_ancestors(&doc) {
            if let Err(e) = versioned::upsert(
                self.store,
                self.collection,
                "_superclass",
                &ancestor_qn,
                &doc,
                &self.library,
            ) {
                log::error!("Dropped subclass entry for {:?}: {e}", doc.id);
            }
        }
        Ok(())
    }
}

/// The qualified names this type is an immediate descendant of.
fn immediate_ancestors(doc: &ApiDoc) -> Vec<String> {
    let stubs = if doc.meta_type == MetaType::Interface {
        doc.interfaces.iter().collect::<Vec<_>>()
    } else {
        doc.superclass.iter().collect()
    };
    stubs
        .into_iter()
        .filter_map(|stub| stub.qualified())
        .filter(|qn| *qn != ROOT_CLASS)
        .map(str::to_string)
        .collect()
}
