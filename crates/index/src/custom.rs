use crate::autocomplete::AutoCompleteIndex;
use crate::error::Result;
use crate::implementors::KnownImplementorsIndex;
use crate::subclasses::KnownSubclassesIndex;
use apidex_store::DocStore;
use serde_json::Value;

/// The contract shared by the derived indexes.
///
/// Every implementation supports a destructive full rebuild, an additive
/// per-library add, and a per-library remove that leaves other
/// libraries' contributions untouched. `build_index` drops first, so
/// queries issued mid-rebuild may observe a partial index; callers
/// needing low disruption use `add_library` instead.
pub trait CustomIndex {
    /// Index name, for logs and reports.
    fn name(&self) -> &'static str;

    /// Drop the index collection(s) and repopulate from every known
    /// library of the target language.
    fn build_index(&self, store: &dyn DocStore) -> Result<()>;

    /// Append one library's entries without disturbing others.
    fn add_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()>;

    fn add_libraries(&self, store: &dyn DocStore, library_ids: &[String]) -> Result<()> {
        for library_id in library_ids {
            self.add_library(store, library_id)?;
        }
        Ok(())
    }

    /// Delete one library's contributions.
    fn remove_library(&self, store: &dyn DocStore, library_id: &str) -> Result<()>;

    /// One-key query: search text for auto-complete, an ancestor
    /// qualified name for the relation indexes.
    fn query(&self, store: &dyn DocStore, key: &str) -> Vec<Value>;
}

/// Every derived index for one language, for batch build/remove
/// operations.
pub fn all_indexes(language: &str) -> Vec<Box<dyn CustomIndex>> {
    vec![
        Box::new(AutoCompleteIndex::new(language)),
        Box::new(KnownSubclassesIndex::new(language)),
        Box::new(KnownImplementorsIndex::new(language)),
    ]
}
