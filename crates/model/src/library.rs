use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Identity of one versioned library.
///
/// Rendered as `"/" + language + "/" + name + "/" + version`, which is also
/// the name of the library's collection in the store. Two libraries are the
/// same library, different version, iff `language` and `name` match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryId {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub language: String,
    pub name: String,
    pub version: String,
}

impl LibraryId {
    pub fn new(
        language: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let (language, name, version) = (language.into(), name.into(), version.into());
        LibraryId {
            id: format!("/{language}/{name}/{version}"),
            language,
            name,
            version,
        }
    }

    /// Parse `"/lang/name/version"` back into its parts.
    pub fn parse(library_id: &str) -> Result<Self> {
        let mut parts = library_id.split('/').filter(|p| !p.is_empty());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(language), Some(name), Some(version), None) => {
                Ok(LibraryId::new(language, name, version))
            }
            _ => Err(ModelError::MalformedLibraryId(library_id.to_string())),
        }
    }

    /// `"/lang/name"` - identifies the library across versions.
    pub fn sans_version(&self) -> String {
        format!("/{}/{}", self.language, self.name)
    }

    /// True if `other` is another version of this library.
    pub fn same_library(&self, other: &LibraryId) -> bool {
        self.language == other.language && self.name == other.name
    }

    /// Compare dotted numeric versions segment by segment.
    ///
    /// Non-numeric segments compare as 0, so `"1.x"` sorts with `"1.0"`.
    pub fn compare_version(&self, other: &LibraryId) -> Ordering {
        compare_versions(&self.version, &other.version)
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<i64> {
        v.split('.')
            .map(|seg| seg.parse::<i64>().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let (x, y) = (a.get(i).copied().unwrap_or(0), b.get(i).copied().unwrap_or(0));
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Keep, per `(language, name)` key, only the highest-version entry.
///
/// Input order is not preserved; the result is sorted by library id for
/// deterministic downstream iteration.
pub fn latest_versions_only(libraries: &[LibraryId]) -> Vec<LibraryId> {
    let mut newest: HashMap<String, LibraryId> = HashMap::new();
    for library in libraries {
        match newest.get(&library.sans_version()) {
            Some(current) if library.compare_version(current) != Ordering::Greater => {}
            _ => {
                newest.insert(library.sans_version(), library.clone());
            }
        }
    }
    let mut result: Vec<LibraryId> = newest.into_values().collect();
    result.sort_by(|a, b| a.id.cmp(&b.id));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_render_round_trip() {
        let lib = LibraryId::parse("/java/java-sdk/1.6").unwrap();
        assert_eq!(lib.language, "java");
        assert_eq!(lib.name, "java-sdk");
        assert_eq!(lib.version, "1.6");
        assert_eq!(lib.id, "/java/java-sdk/1.6");
        assert_eq!(lib.sans_version(), "/java/java-sdk");
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(LibraryId::parse("/java/only-two").is_err());
        assert!(LibraryId::parse("/a/b/c/d").is_err());
        assert!(LibraryId::parse("").is_err());
    }

    #[test]
    fn version_compare_is_numeric_per_segment() {
        let v = |s: &str| LibraryId::new("java", "acme", s);
        assert_eq!(v("1.2").compare_version(&v("1.10")), Ordering::Less);
        assert_eq!(v("2.0").compare_version(&v("1.9.9")), Ordering::Greater);
        assert_eq!(v("1.0").compare_version(&v("1.0.0")), Ordering::Equal);
    }

    #[test]
    fn latest_versions_keeps_one_per_library() {
        let libs = vec![
            LibraryId::new("java", "acme", "1.0"),
            LibraryId::new("java", "acme", "1.2"),
            LibraryId::new("java", "other", "0.1"),
        ];
        let latest = latest_versions_only(&libs);
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().any(|l| l.id == "/java/acme/1.2"));
        assert!(latest.iter().any(|l| l.id == "/java/other/0.1"));
    }
}
