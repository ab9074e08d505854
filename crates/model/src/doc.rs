use crate::error::Result;
use crate::library::LibraryId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaType {
    Package,
    Class,
    Interface,
    Enum,
    AnnotationType,
    Method,
    Constructor,
    Field,
    EnumConstant,
    AnnotationTypeElement,
    Library,
}

impl MetaType {
    /// The four type-category metaTypes.
    pub const TYPES: [MetaType; 4] = [
        MetaType::Class,
        MetaType::Interface,
        MetaType::Enum,
        MetaType::AnnotationType,
    ];

    pub fn is_package(self) -> bool {
        self == MetaType::Package
    }

    /// class / interface / enum / annotationType.
    pub fn is_type(self) -> bool {
        Self::TYPES.contains(&self)
    }

    /// Members whose relative ID carries a parenthesized parameter
    /// signature: method / constructor / annotationTypeElement.
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            MetaType::Method | MetaType::Constructor | MetaType::AnnotationTypeElement
        )
    }

    /// Any member-category metaType.
    pub fn is_member(self) -> bool {
        self.is_callable() || matches!(self, MetaType::Field | MetaType::EnumConstant)
    }
}

/// Partial reference to a type or package.
///
/// Resolution state lives in `id`: `None` means unresolved; `Some` means the
/// target was proven to exist in the same library and the store identifier
/// was stamped by the stub-ID resolver. Cross-library targets are resolved
/// on demand through the reference name index and never stamped here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStub {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<MetaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TypeStub {
    /// The symbolic name this stub resolves through.
    pub fn qualified(&self) -> Option<&str> {
        self.qualified_name
            .as_deref()
            .or(self.qualified_type_name.as_deref())
            .or(self.name.as_deref())
    }

    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

/// Partial reference to a member (method, constructor, field, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStub {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<MetaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Param>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemberStub {
    /// Qualified name of the type declaring this member, derived from the
    /// member's own qualified name (`a.b.C.m` -> `a.b.C`).
    pub fn containing_type(&self) -> Option<&str> {
        let qn = self.qualified_name.as_deref()?;
        qn.rsplit_once('.').map(|(head, _)| head)
    }
}

/// One formal parameter of a callable member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub type_ref: TypeStub,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Minimal stub stored in `_overrides` / `_implements`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
}

impl MemberRef {
    pub fn of(member: &MemberStub) -> Self {
        MemberRef {
            id: member.id.clone(),
            qualified_name: member.qualified_name.clone(),
        }
    }
}

/// Extractor-provided segment of `allInheritedMethods` (same-run
/// visibility only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritedMethods {
    #[serde(default)]
    pub superclass_type: TypeStub,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherited_methods: Vec<MemberStub>,
}

/// Derived segment of `_inherited`: members inherited from one ancestor
/// that no more-derived declaration shadows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritedSegment {
    #[serde(default)]
    pub superclass: TypeStub,
    #[serde(default)]
    pub methods: Vec<MemberStub>,
    /// Declared extension point; currently always empty.
    #[serde(default)]
    pub fields: Vec<MemberStub>,
}

/// One full document: a package, type, or member record.
///
/// Fields prefixed `_` are stamped by the loader (`_id`, `_library`) or
/// derived by the post-processing pipeline; derived fields are absent, not
/// empty, when inapplicable. Everything the extractor emitted that this
/// model does not name passes through `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDoc {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub meta_type: MetaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Param>,

    // Declared relations, single-library scope as seen by the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeStub>,

    // Same-extraction-run relations, nearest-ancestor-first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_superclass_types: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_interface_types: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_inherited_methods: Vec<InheritedMethods>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overridden_method: Option<MemberStub>,

    // Same-library member/containment stubs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MemberStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<MemberStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<MemberStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_constants: Vec<MemberStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_classes: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_package: Option<TypeStub>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_class: Option<TypeStub>,

    // Package-document children lists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ordinary_classes: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<TypeStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotation_types: Vec<TypeStub>,

    // Stamped by the loader.
    #[serde(rename = "_library", default, skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryId>,

    // Derived by the post-processing pipeline; absent until computed.
    #[serde(
        rename = "_superclasses",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub superclasses: Option<Vec<TypeStub>>,
    #[serde(
        rename = "_interfaces",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resolved_interfaces: Option<Vec<TypeStub>>,
    #[serde(rename = "_inherited", default, skip_serializing_if = "Option::is_none")]
    pub inherited: Option<Vec<InheritedSegment>>,
    #[serde(rename = "_overrides", default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<MemberRef>,
    #[serde(
        rename = "_implements",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub implements: Option<MemberRef>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiDoc {
    pub fn from_value(value: Value) -> Result<ApiDoc> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The package-qualified name: packages use `name`, everything else
    /// prefers `qualifiedName` then `qualifiedTypeName`.
    pub fn qualified(&self) -> Option<&str> {
        if self.meta_type.is_package() {
            self.name.as_deref()
        } else {
            self.qualified_name
                .as_deref()
                .or(self.qualified_type_name.as_deref())
        }
    }

    pub fn library_id(&self) -> Option<&str> {
        self.library.as_ref().map(|l| l.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn meta_type_predicates() {
        assert!(MetaType::Enum.is_type());
        assert!(!MetaType::Package.is_type());
        assert!(MetaType::Constructor.is_callable());
        assert!(!MetaType::Field.is_callable());
        assert!(MetaType::Field.is_member());
        assert!(!MetaType::Class.is_member());
    }

    #[test]
    fn unknown_fields_round_trip_through_extra() {
        let value = json!({
            "metaType": "class",
            "name": "Foo",
            "qualifiedName": "com.acme.Foo",
            "modifiers": "public final",
        });
        let doc = ApiDoc::from_value(value).unwrap();
        assert_eq!(doc.extra.get("modifiers"), Some(&json!("public final")));

        let back = doc.to_value().unwrap();
        assert_eq!(back.get("modifiers"), Some(&json!("public final")));
        assert_eq!(back.get("metaType"), Some(&json!("class")));
        // Absent derived fields stay absent, not empty.
        assert!(back.get("_superclasses").is_none());
        assert!(back.get("_inherited").is_none());
    }

    #[test]
    fn qualified_prefers_name_for_packages() {
        let pkg = ApiDoc::from_value(json!({"metaType": "package", "name": "com.acme"})).unwrap();
        assert_eq!(pkg.qualified(), Some("com.acme"));
    }

    #[test]
    fn member_stub_containing_type() {
        let stub = MemberStub {
            qualified_name: Some("com.acme.Foo.parse".to_string()),
            ..Default::default()
        };
        assert_eq!(stub.containing_type(), Some("com.acme.Foo"));
    }
}
