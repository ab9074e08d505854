use crate::custom::CustomIndex;
use crate::error::Result;
use apidex_model::{latest_versions_only, ApiDoc, LibraryId};
use apidex_store::{BulkWriter, DocStore, Filter, Visitor};
use serde_json::{json, Value};
use std::collections::HashSet;

pub const DEFAULT_QUERY_LIMIT: usize = 25;

/// Prefix search over type and package names.
///
/// Two index families are maintained together: one per-language
/// collection covering the latest version of every library, and one
/// per-library collection scoped to a single library/version. A source
/// scan feeds both through two concurrently open bulk writers.
pub struct AutoCompleteIndex {
    language: String,
    language_collection: String,
}

impl AutoCompleteIndex {
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        AutoCompleteIndex {
            language_collection: format!("/{language}/autoCompleteIndex"),
            language,
        }
    }

    pub fn language_collection(&self) -> &str {
        &self.language_collection
    }

    pub fn library_collection(library_id: &str) -> String {
        format!("{library_id}/autoCompleteIndex")
    }

    /// Search across the latest version of every library of this
    /// language.
    pub fn query_language(&self, store: &dyn DocStore, text: &str, limit: usize) -> Vec<Value> {
        query_collection(store, &self.language_collection, text, limit)
    }

    /// Search within one library/version only.
    pub fn query_library(
        &self,
        store: &dyn DocStore,
        library_id: &str,
        text: &str,
        limit: usize,
    ) -> Vec<Value> {
        query_collection(store, &Self::library_collection(library_id), text, limit)
    }

    fn stream_library(
        &self,
        store: &dyn DocStore,
        library: &LibraryId,
        into_language_index: bool,
        into_library_index: bool,
    ) -> Result<()> {
        let mut builder = Builder {
            library: library.clone(),
            language_writer: into_language_index
                .then(|| BulkWriter::new(store, self.language_collection.clone())),
            library_writer: into_library_index
                .then(|| BulkWriter::new(store, Self::library_collection(&library.id))),
        };
        store.for_all_in(&library.id, &mut builder)?;
        Ok(())
    }

    /// True if no other stored version of this library is newer.
    fn is_latest_version(&self, store: &dyn DocStore, library: &LibraryId) -> bool {
        store
            .get_library_versions(&self.language, &library.name)
            .iter()
            .filter_map(|v| v.get("version").and_then(Value::as_str))
            .all(|version| {
                LibraryId::new(&self.language, &library.name, version).compare_version(library)
                    != std::cmp::Ordering::Greater
            })
    }
}

impl CustomIndex for AutoCompleteIndex {
    fn name(&self) -> &'static str {
        "autoCompleteIndex"
    }

    fn build_index(&self, store: &dyn DocStore) -> Result<()> {
        log::info!("Building {}", self.language_collection);
        store.drop_collection(&self.language_collection);
        store.create_index(&self.language_collection, &[("_searchName", 1)]);

        let libraries: Vec<LibraryId> = store
            .get_library_ids(&self.language)
            .iter()
            .filter_map(|id| LibraryId::parse(id).ok())
            .collect();
        let latest: HashSet<String> = latest_versions_only(&libraries)
            .into_iter()
            .map(|l| l.id)
            .collect();

        for library in &libraries {
            store.drop_collection(&Self::library_collection(&library.id));
            self.stream_library(store, library, latest.contains(&library.id), true)?;
        }
        Ok(())
    }

    fn add_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        let library = LibraryId::parse(library_id)?;
        store.drop_collection(&Self::library_collection(library_id));

        let into_language = self.is_latest_version(store, &library);
        if into_language {
            // This version supersedes any older version's entries in the
            // shared index.
            store.remove(
                &self.language_collection,
                &Filter::new().eq("_library.name", library.name.as_str()),
            )?;
        }
        self.stream_library(store, &library, into_language, true)
    }

    fn remove_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        let library = LibraryId::parse(library_id)?;
        store.drop_collection(&Self::library_collection(library_id));
        store.remove(
            &self.language_collection,
            &Filter::new().eq("_library._id", library_id),
        )?;

        // If the removed version fed the shared index, promote the newest
        // surviving version so the library stays searchable.
        let survivor = store
            .get_library_versions(&self.language, &library.name)
            .iter()
            .filter_map(|v| v.get("version").and_then(Value::as_str))
            .filter(|version| *version != library.version)
            .map(|version| LibraryId::new(&self.language, &library.name, version))
            .max_by(|a, b| a.compare_version(b));
        if let Some(survivor) = survivor {
            store.remove(
                &self.language_collection,
                &Filter::new().eq("_library.name", library.name.as_str()),
            )?;
            self.stream_library(store, &survivor, true, false)?;
        }
        Ok(())
    }

    fn query(&self, store: &dyn DocStore, key: &str) -> Vec<Value> {
        self.query_language(store, key, DEFAULT_QUERY_LIMIT)
    }
}

fn query_collection(store: &dyn DocStore, collection: &str, text: &str, limit: usize) -> Vec<Value> {
    // A trailing space asks for an exact match; anything else is a
    // case-insensitive prefix match.
    let exact = text.ends_with(' ');
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let filter = if exact {
        Filter::new().eq("_searchName", needle)
    } else {
        match Filter::new().prefix("_searchName", &needle) {
            Ok(filter) => filter,
            Err(_) => return Vec::new(),
        }
    };
    store.find_limit(collection, &filter, limit)
}

struct Builder<'a> {
    library: LibraryId,
    language_writer: Option<BulkWriter<'a>>,
    library_writer: Option<BulkWriter<'a>>,
}

impl Visitor for Builder<'_> {
    fn call(&mut self, _collection: &str, value: &Value) -> apidex_store::Result<()> {
        let Ok(doc) = ApiDoc::from_value(value.clone()) else {
            return Ok(());
        };
        if !(doc.meta_type.is_package() || doc.meta_type.is_type()) {
            return Ok(());
        }
        let Some(doc_id) = doc.id.as_deref() else {
            return Ok(());
        };
        for search_name in search_names(&doc) {
            let entry = json!({
                "_id": format!("{doc_id}/{search_name}"),
                "id": doc_id,
                "name": search_name,
                "_searchName": search_name.to_lowercase(),
                "metaType": doc.meta_type,
                "_library": &self.library,
            });
            if let Some(writer) = self.language_writer.as_mut() {
                writer.safe_insert(entry.clone());
            }
            if let Some(writer) = self.library_writer.as_mut() {
                writer.safe_insert(entry);
            }
        }
        Ok(())
    }

    fn after(&mut self, _collection: &str) -> apidex_store::Result<()> {
        if let Some(writer) = self.language_writer.as_mut() {
            writer.flush()?;
        }
        if let Some(writer) = self.library_writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// The names a document is findable under: every trailing dotted
/// suffix for packages (`a.b.c` -> `a.b.c`, `b.c`, `c`), the simple
/// name for types.
fn search_names(doc: &ApiDoc) -> Vec<String> {
    let Some(name) = doc.name.as_deref() else {
        return Vec::new();
    };
    if !doc.meta_type.is_package() {
        return vec![name.to_string()];
    }
    let mut names = vec![name.to_string()];
    let mut rest = name;
    while let Some((_, suffix)) = rest.split_once('.') {
        names.push(suffix.to_string());
        rest = suffix;
    }
    names
}
