//! Version-set entries shared by the subclass and implementor indexes.
//!
//! Both indexes key their entries sans library version
//! (`/language/name/relativeId/ancestorQn`) and carry a
//! `_libraryVersions` set, so all versions of a library share one entry
//! and removing one version leaves the entry alive for the others.

use crate::error::Result;
use apidex_model::{ApiDoc, LibraryId};
use apidex_store::{DocStore, Filter};
use serde_json::{json, Value};

/// The document id with the library version stripped:
/// `/java/acme/1.0/com.acme.Foo` -> `/java/acme/com.acme.Foo`.
pub(crate) fn id_sans_version(doc_id: &str, library: &LibraryId) -> Option<String> {
    doc_id
        .strip_prefix(library.id.as_str())
        .map(|relative| format!("{}{relative}", library.sans_version()))
}

/// Insert or update one entry keyed by `key_field` = `ancestor_qn`,
/// adding `library.version` to the entry's version set. Re-adding an
/// already present version is a no-op, so rebuilds are idempotent.
pub(crate) fn upsert(
    store: &dyn DocStore,
    collection: &str,
    key_field: &str,
    ancestor_qn: &str,
    doc: &ApiDoc,
    library: &LibraryId,
) -> Result<()> {
    let Some(doc_id) = doc.id.as_deref() else {
        return Ok(());
    };
    let Some(sans_version) = id_sans_version(doc_id, library) else {
        return Ok(());
    };
    let entry_id = format!("{sans_version}/{ancestor_qn}");

    let entry = match store.read(collection, &entry_id) {
        Some(mut existing) => {
            let versions = existing
                .get_mut("_libraryVersions")
                .and_then(Value::as_array_mut);
            match versions {
                Some(versions) => {
                    let version = Value::from(library.version.as_str());
                    if versions.contains(&version) {
                        return Ok(());
                    }
                    versions.push(version);
                    existing
                }
                None => fresh_entry(&entry_id, key_field, ancestor_qn, doc, library),
            }
        }
        None => fresh_entry(&entry_id, key_field, ancestor_qn, doc, library),
    };
    store.save(collection, entry)?;
    Ok(())
}

fn fresh_entry(
    entry_id: &str,
    key_field: &str,
    ancestor_qn: &str,
    doc: &ApiDoc,
    library: &LibraryId,
) -> Value {
    json!({
        "_id": entry_id,
        key_field: ancestor_qn,
        "name": doc.name,
        "qualifiedName": doc.qualified(),
        "metaType": doc.meta_type,
        "_library": {"language": library.language, "name": library.name},
        "_libraryVersions": [library.version],
    })
}

/// Remove one library version's contributions. Entries contributed
/// solely by this version are deleted; entries shared with other
/// versions only lose this version from their set.
pub(crate) fn remove_library(
    store: &dyn DocStore,
    collection: &str,
    library: &LibraryId,
) -> Result<usize> {
    // Trailing separator keeps `/java/acme` from matching `/java/acme2`.
    let prefix = format!("{}/", library.sans_version());
    let filter = Filter::new().prefix("_id", &prefix)?;
    let mut removed = 0;
    for mut entry in store.find(collection, &filter) {
        let version = Value::from(library.version.as_str());
        let Some(versions) = entry
            .get_mut("_libraryVersions")
            .and_then(Value::as_array_mut)
        else {
            continue;
        };
        if !versions.contains(&version) {
            continue;
        }
        versions.retain(|v| *v != version);
        if versions.is_empty() {
            let id = entry.get("_id").and_then(Value::as_str).unwrap_or_default();
            removed += store.remove(collection, &Filter::new().eq("_id", id))?;
        } else {
            store.save(collection, entry)?;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sans_version_strips_only_the_version_segment() {
        let lib = LibraryId::new("java", "acme", "1.0");
        assert_eq!(
            id_sans_version("/java/acme/1.0/com.acme.Foo", &lib).as_deref(),
            Some("/java/acme/com.acme.Foo")
        );
        assert_eq!(id_sans_version("/java/other/1.0/com.acme.Foo", &lib), None);
    }
}
