use crate::error::Result;
use apidex_model::{build_id, ApiDoc, MemberStub, MetaType, TypeStub};
use apidex_store::{DocStore, Filter, Visitor};
use serde_json::Value;
use std::collections::HashSet;

/// Stage 1: stamp store identifiers onto same-library stubs.
///
/// Declared members, containment links, and package children provably
/// live in the same library, so their ids are constructed outright.
/// Structures that may cross library boundaries (`allSuperclassTypes`,
/// `allInterfaceTypes`, inherited-method stubs, the overridden-method
/// stub) are stamped only when the referenced type name is known to this
/// library; otherwise the stub stays unresolved for later cross-library
/// lookup through the reference name index.
pub struct SetStubIds;

impl SetStubIds {
    pub fn run(store: &dyn DocStore, library_id: &str) -> Result<()> {
        log::info!("Setting stub ids for {library_id}");
        let mut stamper = Stamper {
            store,
            library_id: library_id.to_string(),
            known_types: known_type_names(store, library_id)?,
        };
        store.for_all_in(library_id, &mut stamper)?;
        Ok(())
    }
}

/// Qualified names of every type declared in the library.
fn known_type_names(store: &dyn DocStore, library_id: &str) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    for meta_type in MetaType::TYPES {
        let filter = Filter::new().eq("metaType", serde_json::to_value(meta_type)?);
        for doc in store.find(library_id, &filter) {
            if let Some(qn) = doc.get("qualifiedName").and_then(Value::as_str) {
                names.insert(qn.to_string());
            }
        }
    }
    Ok(names)
}

struct Stamper<'a> {
    store: &'a dyn DocStore,
    library_id: String,
    known_types: HashSet<String>,
}

impl Stamper<'_> {
    fn stamp_type(&self, stub: &mut TypeStub) {
        if stub.id.is_none() {
            stub.id = build_id(&self.library_id, &*stub);
        }
    }

    fn stamp_member(&self, stub: &mut MemberStub) {
        if stub.id.is_none() {
            stub.id = build_id(&self.library_id, &*stub);
        }
    }

    fn stamp_type_if_known(&self, stub: &mut TypeStub) {
        if stub.qualified().is_some_and(|qn| self.known_types.contains(qn)) {
            self.stamp_type(stub);
        }
    }

    fn stamp_member_if_known(&self, stub: &mut MemberStub) {
        if stub
            .containing_type()
            .is_some_and(|qn| self.known_types.contains(qn))
        {
            self.stamp_member(stub);
        }
    }
}

impl Visitor for Stamper<'_> {
    fn call(&mut self, collection: &str, value: &Value) -> apidex_store::Result<()> {
        let mut doc = match ApiDoc::from_value(value.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Skipping unparseable document: {e}");
                return Ok(());
            }
        };

        for stub in doc
            .methods
            .iter_mut()
            .chain(doc.constructors.iter_mut())
            .chain(doc.fields.iter_mut())
            .chain(doc.enum_constants.iter_mut())
        {
            self.stamp_member(stub);
        }
        for stub in doc.inner_classes.iter_mut() {
            self.stamp_type(stub);
        }
        if let Some(stub) = doc.containing_class.as_mut() {
            self.stamp_type(stub);
        }
        if let Some(stub) = doc.containing_package.as_mut() {
            self.stamp_type(stub);
        }

        if doc.meta_type.is_package() {
            for stub in doc
                .ordinary_classes
                .iter_mut()
                .chain(doc.interfaces.iter_mut())
                .chain(doc.exceptions.iter_mut())
                .chain(doc.errors.iter_mut())
                .chain(doc.enums.iter_mut())
                .chain(doc.annotation_types.iter_mut())
            {
                self.stamp_type(stub);
            }
        }

        for stub in doc
            .all_superclass_types
            .iter_mut()
            .chain(doc.all_interface_types.iter_mut())
        {
            self.stamp_type_if_known(stub);
        }
        for segment in doc.all_inherited_methods.iter_mut() {
            self.stamp_type_if_known(&mut segment.superclass_type);
            for member in segment.inherited_methods.iter_mut() {
                self.stamp_member_if_known(member);
            }
        }
        if let Some(stub) = doc.overridden_method.as_mut() {
            self.stamp_member_if_known(stub);
        }

        self.store.save(collection, serde_json::to_value(&doc)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidex_model::LibraryId;
    use apidex_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn local_stubs_are_stamped_cross_library_stubs_are_not() {
        let store = MemoryStore::new();
        let lib = LibraryId::parse("/java/acme/1.0").unwrap();
        store
            .save(
                "/java/acme/1.0",
                json!({
                    "_id": "/java/acme/1.0/com.acme.Sub",
                    "metaType": "class",
                    "name": "Sub",
                    "qualifiedName": "com.acme.Sub",
                    "methods": [{"metaType": "method", "name": "m",
                                 "qualifiedName": "com.acme.Sub.m"}],
                    "allSuperclassTypes": [
                        {"qualifiedTypeName": "com.acme.Base"},
                        {"qualifiedTypeName": "external.lib.Type"},
                    ],
                    "_library": &lib,
                }),
            )
            .unwrap();
        store
            .save(
                "/java/acme/1.0",
                json!({
                    "_id": "/java/acme/1.0/com.acme.Base",
                    "metaType": "class",
                    "name": "Base",
                    "qualifiedName": "com.acme.Base",
                    "_library": &lib,
                }),
            )
            .unwrap();

        SetStubIds::run(&store, "/java/acme/1.0").unwrap();

        let doc = store
            .read("/java/acme/1.0", "/java/acme/1.0/com.acme.Sub")
            .unwrap();
        // Declared members are always stamped.
        assert_eq!(
            doc["methods"][0]["_id"],
            "/java/acme/1.0/com.acme.Sub.m()"
        );
        // Locally known ancestor is stamped; the external one is left
        // unresolved.
        assert_eq!(
            doc["allSuperclassTypes"][0]["_id"],
            "/java/acme/1.0/com.acme.Base"
        );
        assert!(doc["allSuperclassTypes"][1].get("_id").is_none());
    }

    #[test]
    fn rerun_does_not_regress_resolved_stubs() {
        let store = MemoryStore::new();
        let lib = LibraryId::parse("/java/acme/1.0").unwrap();
        store
            .save(
                "/java/acme/1.0",
                json!({
                    "_id": "/java/acme/1.0/com.acme.Foo",
                    "metaType": "class",
                    "name": "Foo",
                    "qualifiedName": "com.acme.Foo",
                    "methods": [{"metaType": "method", "name": "go",
                                 "qualifiedName": "com.acme.Foo.go"}],
                    "_library": &lib,
                }),
            )
            .unwrap();

        SetStubIds::run(&store, "/java/acme/1.0").unwrap();
        let first = store.read("/java/acme/1.0", "/java/acme/1.0/com.acme.Foo");
        SetStubIds::run(&store, "/java/acme/1.0").unwrap();
        let second = store.read("/java/acme/1.0", "/java/acme/1.0/com.acme.Foo");
        assert_eq!(first, second);
    }
}
