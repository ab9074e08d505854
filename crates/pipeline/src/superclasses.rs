use crate::error::Result;
use apidex_index::ReferenceNameIndex;
use apidex_model::{ApiDoc, LibraryId, TypeStub};
use apidex_store::{DocStore, Visitor};
use serde_json::Value;
use std::collections::HashSet;

/// Stage 2: resolve the full ancestor chain across library boundaries.
///
/// A library's extractor only sees ancestors within its own run, so a
/// type's `allSuperclassTypes` may stop at a library boundary. This
/// stage concatenates those same-run lists: take the document's own
/// list, jump to its oldest entry, resolve that qualified name through
/// the reference name index (same-library match preferred), and
/// continue from the resolved document. The result is saved as
/// `_superclasses`, nearest-ancestor-first. `_interfaces` is computed
/// the same way from `allInterfaceTypes`, deduplicated by qualified
/// name in first-seen order.
pub struct CollectSuperclasses;

impl CollectSuperclasses {
    pub fn run(store: &dyn DocStore, library_id: &str) -> Result<()> {
        log::info!("Collecting superclasses for {library_id}");
        let library = LibraryId::parse(library_id)?;
        let mut resolver = Resolver {
            store,
            ref_index: ReferenceNameIndex::new(&library.language),
            library_id: library.id,
        };
        store.for_all_in(library_id, &mut resolver)?;
        Ok(())
    }
}

struct Resolver<'a> {
    store: &'a dyn DocStore,
    ref_index: ReferenceNameIndex,
    library_id: String,
}

impl Resolver<'_> {
    /// Concatenate the same-run lists along the ancestor chain. The
    /// visited set guards against malformed cyclic ancestry in
    /// untrusted input.
    fn walk(&self, doc: &ApiDoc, list: fn(&ApiDoc) -> &[TypeStub]) -> Vec<TypeStub> {
        let mut out: Vec<TypeStub> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = doc.clone();
        loop {
            let stubs = list(&current);
            if stubs.is_empty() {
                break;
            }
            let oldest = stubs
                .last()
                .and_then(TypeStub::qualified)
                .map(str::to_string);
            out.extend(stubs.iter().cloned());

            let Some(qn) = oldest else { break };
            if !visited.insert(qn.clone()) {
                break;
            }
            let from = current.library_id().unwrap_or(&self.library_id).to_string();
            let Some(next) = self.ref_index.resolve(self.store, &qn, &from) else {
                break;
            };
            let Ok(next) = ApiDoc::from_value(next) else { break };
            current = next;
        }
        out
    }
}

impl Visitor for Resolver<'_> {
    fn call(&mut self, collection: &str, value: &Value) -> apidex_store::Result<()> {
        let mut doc = match ApiDoc::from_value(value.clone()) {
            Ok(doc) => doc,
            Err(_) => return Ok(()),
        };
        if !doc.meta_type.is_type() {
            return Ok(());
        }

        doc.superclasses = Some(self.walk(&doc, |d| &d.all_superclass_types));

        let mut interfaces = self.walk(&doc, |d| &d.all_interface_types);
        let mut seen: HashSet<String> = HashSet::new();
        interfaces.retain(|stub| match stub.qualified() {
            Some(qn) => seen.insert(qn.to_string()),
            None => true,
        });
        doc.resolved_interfaces = Some(interfaces);

        self.store.save(collection, serde_json::to_value(&doc)?)
    }
}
