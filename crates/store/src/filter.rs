use crate::error::{Result, StoreError};
use regex::Regex;
use serde_json::Value;

/// One clause of a filter: equality against a JSON value, or a regex
/// match against a string field (the `{"$regex": pattern}` wire form).
#[derive(Debug, Clone)]
pub enum Match {
    Eq(Value),
    Regex(Regex),
}

/// Conjunction of field constraints. Field paths may be dotted to reach
/// nested attributes (`_library.name`).
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Match)>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((path.into(), Match::Eq(value.into())));
        self
    }

    pub fn regex(mut self, path: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| StoreError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.clauses.push((path.into(), Match::Regex(regex)));
        Ok(self)
    }

    /// Anchored prefix match; the prefix text is escaped before compiling.
    pub fn prefix(self, path: impl Into<String>, prefix: &str) -> Result<Self> {
        self.regex(path, &format!("^{}", regex::escape(prefix)))
    }

    /// Parse the wire form: an object of field -> expected value, where a
    /// value of `{"$regex": pattern}` requests pattern matching.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter(format!("not an object: {value}")))?;
        let mut filter = Filter::new();
        for (path, expected) in object {
            match expected.get("$regex").and_then(Value::as_str) {
                Some(pattern) => filter = filter.regex(path, pattern)?,
                None => filter = filter.eq(path, expected.clone()),
            }
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True if every clause matches the given document.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|(path, m)| {
            let field = lookup(doc, path);
            match m {
                Match::Eq(expected) => field == Some(expected),
                Match::Regex(regex) => field
                    .and_then(Value::as_str)
                    .is_some_and(|s| regex.is_match(s)),
            }
        })
    }
}

/// Resolve a dotted field path against a JSON object.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, key| value.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_and_dotted_paths() {
        let doc = json!({"metaType": "class", "_library": {"name": "acme", "version": "1.0"}});

        assert!(Filter::new().eq("metaType", "class").matches(&doc));
        assert!(Filter::new().eq("_library.name", "acme").matches(&doc));
        assert!(!Filter::new().eq("_library.name", "other").matches(&doc));
        assert!(!Filter::new().eq("missing.path", "x").matches(&doc));
        assert!(Filter::new()
            .eq("metaType", "class")
            .eq("_library.version", "1.0")
            .matches(&doc));
    }

    #[test]
    fn regex_matches_string_fields_only() {
        let doc = json!({"_searchName": "demojavadoc", "n": 7});
        let filter = Filter::new().regex("_searchName", "^demo").unwrap();
        assert!(filter.matches(&doc));
        assert!(!Filter::new().regex("n", "^7").unwrap().matches(&doc));
    }

    #[test]
    fn prefix_escapes_metacharacters() {
        let doc = json!({"_id": "/java/acme/1.0/com.acme.Foo.parse(java.lang.String)"});
        let filter = Filter::new()
            .prefix("_id", "/java/acme/1.0/com.acme.Foo.parse(")
            .unwrap();
        assert!(filter.matches(&doc));
    }

    #[test]
    fn wire_form_round_trip() {
        let filter = Filter::from_value(&json!({
            "metaType": "package",
            "_searchName": {"$regex": "^demo"},
        }))
        .unwrap();
        assert!(filter.matches(&json!({"metaType": "package", "_searchName": "demo.app"})));
        assert!(!filter.matches(&json!({"metaType": "class", "_searchName": "demo.app"})));

        assert!(Filter::from_value(&json!(["not", "an", "object"])).is_err());
        assert!(Filter::from_value(&json!({"f": {"$regex": "("}})).is_err());
    }
}
