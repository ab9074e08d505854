use crate::error::Result;
use apidex_index::ReferenceNameIndex;
use apidex_model::{method_overrides, ApiDoc, InheritedSegment, LibraryId, MemberStub};
use apidex_store::{DocStore, Visitor};
use serde_json::Value;
use std::collections::HashSet;

/// Stage 3: collect the members each type inherits from its ancestors.
///
/// Walks the `superclass` chain one hop at a time, resolving each hop
/// through the reference name index. At each ancestor, the methods not
/// already declared or inherited by something more derived form one
/// `_inherited` segment; the ancestor's declared methods are merged
/// into the accumulator regardless, so a grand-ancestor's method
/// already inherited by a middle ancestor is not re-reported. Field
/// inheritance is a declared extension point and stays empty.
pub struct CollectInheritedMembers;

impl CollectInheritedMembers {
    pub fn run(store: &dyn DocStore, library_id: &str) -> Result<()> {
        log::info!("Collecting inherited members for {library_id}");
        let library = LibraryId::parse(library_id)?;
        let mut collector = Collector {
            store,
            ref_index: ReferenceNameIndex::new(&library.language),
            library_id: library.id,
        };
        store.for_all_in(library_id, &mut collector)?;
        Ok(())
    }
}

struct Collector<'a> {
    store: &'a dyn DocStore,
    ref_index: ReferenceNameIndex,
    library_id: String,
}

impl Collector<'_> {
    fn collect(&self, doc: &ApiDoc) -> Vec<InheritedSegment> {
        let mut accumulated: Vec<MemberStub> = doc.methods.clone();
        let mut segments: Vec<InheritedSegment> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = doc.clone();

        loop {
            let Some(super_stub) = current.superclass.clone() else {
                break;
            };
            let Some(qn) = super_stub.qualified().map(str::to_string) else {
                break;
            };
            if !visited.insert(qn.clone()) {
                break;
            }
            let from = current.library_id().unwrap_or(&self.library_id).to_string();
            let Some(value) = self.ref_index.resolve(self.store, &qn, &from) else {
                break;
            };
            let Ok(ancestor) = ApiDoc::from_value(value) else { break };

            let inherited: Vec<MemberStub> = ancestor
                .methods
                .iter()
                .filter(|method| {
                    !accumulated
                        .iter()
                        .any(|declared| method_overrides(declared, *method))
                })
                .cloned()
                .collect();
            if !inherited.is_empty() {
                segments.push(InheritedSegment {
                    superclass: super_stub,
                    methods: inherited,
                    fields: Vec::new(),
                });
            }
            accumulated.extend(ancestor.methods.iter().cloned());
            current = ancestor;
        }
        segments
    }
}

impl Visitor for Collector<'_> {
    fn call(&mut self, collection: &str, value: &Value) -> apidex_store::Result<()> {
        let mut doc = match ApiDoc::from_value(value.clone()) {
            Ok(doc) => doc,
            Err(_) => return Ok(()),
        };
        if !doc.meta_type.is_type() {
            return Ok(());
        }

        let segments = self.collect(&doc);
        // Absence, not an empty list, signals "nothing inherited".
        if segments.is_empty() {
            return Ok(());
        }
        doc.inherited = Some(segments);
        self.store.save(collection, serde_json::to_value(&doc)?)
    }
}
