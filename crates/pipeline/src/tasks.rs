//! Admin operations spanning the pipeline and every index.

use crate::error::Result;
use crate::post_processor::PostProcessor;
use apidex_index::{all_indexes, CustomIndex, ReferenceNameIndex};
use apidex_model::LibraryId;
use apidex_store::{DocStore, Filter, LIBRARY_COLLECTION};

/// Success/failure counts of a batch index operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl TaskReport {
    fn record<T>(&mut self, what: &str, result: Result<T>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(e) => {
                log::error!("{what} failed: {e}");
                self.failed += 1;
            }
        }
    }
}

/// Onboard one already-loaded library: reference name entries first,
/// then the resolution stages, then the derived indexes.
pub fn add_library(store: &dyn DocStore, library_id: &str) -> Result<()> {
    let library = LibraryId::parse(library_id)?;
    ReferenceNameIndex::new(&library.language).add_library(store, library_id)?;
    PostProcessor::new(&library.language).run(store, library_id)?;
    for index in all_indexes(&library.language) {
        index.add_library(store, library_id)?;
    }
    Ok(())
}

/// Drop and rebuild every index of one language.
pub fn build_all_indexes(store: &dyn DocStore, language: &str) -> TaskReport {
    let mut report = TaskReport::default();
    report.record(
        "reference name index build",
        ReferenceNameIndex::new(language)
            .build_index(store)
            .map_err(Into::into),
    );
    for index in all_indexes(language) {
        report.record(
            index.name(),
            index.build_index(store).map_err(Into::into),
        );
    }
    report
}

/// Remove one library version everywhere: every index, the overview
/// record, and the library collection itself.
pub fn remove_library(store: &dyn DocStore, library_id: &str) -> Result<TaskReport> {
    let library = LibraryId::parse(library_id)?;
    log::info!("Removing library {library_id}");

    let mut report = TaskReport::default();
    for index in all_indexes(&library.language) {
        report.record(
            index.name(),
            index.remove_library(store, library_id).map_err(Into::into),
        );
    }
    report.record(
        "reference name index removal",
        ReferenceNameIndex::new(&library.language)
            .remove_library(store, library_id)
            .map_err(Into::into),
    );

    store.remove(LIBRARY_COLLECTION, &Filter::new().eq("_id", library_id))?;
    store.drop_collection(library_id);
    Ok(report)
}
