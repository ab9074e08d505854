use crate::error::Result;
use crate::inherited::CollectInheritedMembers;
use crate::overrides::LinkOverriddenMethods;
use crate::stub_ids::SetStubIds;
use crate::superclasses::CollectSuperclasses;
use apidex_store::DocStore;

/// Runs the resolution stages over a library in their fixed dependency
/// order: stub ids, then superclasses/interfaces, then inherited
/// members, then override/implements links.
///
/// The reference name index must already cover the processed libraries;
/// every stage past the first resolves through it.
pub struct PostProcessor {
    language: String,
}

impl PostProcessor {
    pub fn new(language: impl Into<String>) -> Self {
        PostProcessor {
            language: language.into(),
        }
    }

    pub fn run(&self, store: &dyn DocStore, library_id: &str) -> Result<()> {
        log::info!("Post-processing {library_id}");
        SetStubIds::run(store, library_id)?;
        CollectSuperclasses::run(store, library_id)?;
        CollectInheritedMembers::run(store, library_id)?;
        LinkOverriddenMethods::run(store, library_id)?;
        Ok(())
    }

    pub fn run_all(&self, store: &dyn DocStore, library_ids: &[String]) -> Result<()> {
        for library_id in library_ids {
            self.run(store, library_id)?;
        }
        Ok(())
    }

    /// Process every known library of this processor's language.
    pub fn run_language(&self, store: &dyn DocStore) -> Result<()> {
        self.run_all(store, &store.get_library_ids(&self.language))
    }
}
