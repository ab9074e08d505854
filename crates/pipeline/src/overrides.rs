use crate::error::Result;
use apidex_index::ReferenceNameIndex;
use apidex_model::{build_id, find_overridden, ApiDoc, LibraryId, MemberRef, MemberStub, MetaType};
use apidex_store::{DocStore, Visitor};
use serde_json::Value;

/// Stage 4: link each method to what it overrides and implements.
///
/// Depends on the resolved `_superclasses`/`_interfaces` of the
/// containing class (stage 2) and on interfaces' `_inherited` segments
/// (stage 3), so it must run last. A method gets `_overrides` for the
/// nearest ancestor-class method with the same signature and
/// `_implements` for the nearest interface method; the document is only
/// saved when at least one was found.
pub struct LinkOverriddenMethods;

impl LinkOverriddenMethods {
    pub fn run(store: &dyn DocStore, library_id: &str) -> Result<()> {
        log::info!("Linking overridden methods for {library_id}");
        let library = LibraryId::parse(library_id)?;
        let mut linker = Linker {
            store,
            ref_index: ReferenceNameIndex::new(&library.language),
            library_id: library.id,
        };
        store.for_all_in(library_id, &mut linker)?;
        Ok(())
    }
}

struct Linker<'a> {
    store: &'a dyn DocStore,
    ref_index: ReferenceNameIndex,
    library_id: String,
}

impl Linker<'_> {
    fn resolve_type(&self, qn: &str, from_library: &str) -> Option<ApiDoc> {
        let value = self.ref_index.resolve(self.store, qn, from_library)?;
        ApiDoc::from_value(value).ok()
    }

    /// Nearest ancestor-class method with the same signature.
    fn find_overridden_in_ancestors(&self, method: &ApiDoc, class: &ApiDoc) -> Option<MemberRef> {
        let from = class.library_id().unwrap_or(&self.library_id).to_string();
        for ancestor_stub in class.superclasses.iter().flatten() {
            let Some(qn) = ancestor_stub.qualified() else {
                continue;
            };
            let Some(ancestor) = self.resolve_type(qn, &from) else {
                continue;
            };
            if let Some(hit) = find_overridden(method, &ancestor.methods) {
                return Some(member_ref(hit, &ancestor));
            }
        }
        None
    }

    /// Nearest interface method with the same signature, searching each
    /// interface's declared methods and its own inherited segments.
    fn find_implemented(&self, method: &ApiDoc, class: &ApiDoc) -> Option<MemberRef> {
        let from = class.library_id().unwrap_or(&self.library_id).to_string();
        for interface_stub in class.resolved_interfaces.iter().flatten() {
            let Some(qn) = interface_stub.qualified() else {
                continue;
            };
            let Some(interface) = self.resolve_type(qn, &from) else {
                continue;
            };
            if let Some(hit) = find_overridden(method, &interface.methods) {
                return Some(member_ref(hit, &interface));
            }
            for segment in interface.inherited.iter().flatten() {
                if let Some(hit) = find_overridden(method, &segment.methods) {
                    return Some(MemberRef::of(hit));
                }
            }
        }
        None
    }
}

/// Minimal stub of the matched method; the id is constructed from the
/// owner's library when the extractor left the stub unresolved.
fn member_ref(hit: &MemberStub, owner: &ApiDoc) -> MemberRef {
    MemberRef {
        id: hit
            .id
            .clone()
            .or_else(|| owner.library_id().and_then(|lib| build_id(lib, hit))),
        qualified_name: hit.qualified_name.clone(),
    }
}

impl Visitor for Linker<'_> {
    fn call(&mut self, collection: &str, value: &Value) -> apidex_store::Result<()> {
        let mut doc = match ApiDoc::from_value(value.clone()) {
            Ok(doc) => doc,
            Err(_) => return Ok(()),
        };
        if doc.meta_type != MetaType::Method {
            return Ok(());
        }

        let containing_qn = doc
            .containing_class
            .as_ref()
            .and_then(|c| c.qualified())
            .map(str::to_string)
            .or_else(|| {
                doc.qualified_name
                    .as_deref()
                    .and_then(|qn| qn.rsplit_once('.'))
                    .map(|(head, _)| head.to_string())
            });
        let Some(containing_qn) = containing_qn else {
            return Ok(());
        };
        let from = doc.library_id().unwrap_or(&self.library_id).to_string();
        let Some(class) = self.resolve_type(&containing_qn, &from) else {
            return Ok(());
        };

        let overrides = self.find_overridden_in_ancestors(&doc, &class);
        let implements = self.find_implemented(&doc, &class);
        if overrides.is_none() && implements.is_none() {
            return Ok(());
        }
        doc.overrides = overrides;
        doc.implements = implements;
        self.store.save(collection, serde_json::to_value(&doc)?)
    }
}
