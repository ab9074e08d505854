use crate::doc::{ApiDoc, MemberStub, MetaType, Param, TypeStub};

/// Anything a deterministic store identifier can be built for: full
/// documents and the stubs embedded inside them.
pub trait Identified {
    fn meta_type(&self) -> Option<MetaType>;
    fn qualified(&self) -> Option<&str>;
    fn parameters(&self) -> &[Param];
}

impl Identified for ApiDoc {
    fn meta_type(&self) -> Option<MetaType> {
        Some(self.meta_type)
    }

    fn qualified(&self) -> Option<&str> {
        ApiDoc::qualified(self)
    }

    fn parameters(&self) -> &[Param] {
        &self.parameters
    }
}

impl Identified for MemberStub {
    fn meta_type(&self) -> Option<MetaType> {
        self.meta_type
    }

    fn qualified(&self) -> Option<&str> {
        self.qualified_name.as_deref()
    }

    fn parameters(&self) -> &[Param] {
        &self.parameters
    }
}

impl Identified for TypeStub {
    fn meta_type(&self) -> Option<MetaType> {
        self.meta_type
    }

    fn qualified(&self) -> Option<&str> {
        TypeStub::qualified(self)
    }

    fn parameters(&self) -> &[Param] {
        &[]
    }
}

/// Fully-qualified parameter signature: `(a.b.C,int[])`.
///
/// Each parameter renders as `qualifiedTypeName + dimension`. This is the
/// sole disambiguator for overloaded members.
pub fn qualified_signature(params: &[Param]) -> String {
    signature(params, |t| {
        t.qualified_type_name.as_deref().or(t.type_name.as_deref())
    })
}

/// Non-qualified parameter signature: `(C,int[])`.
pub fn simple_signature(params: &[Param]) -> String {
    signature(params, |t| {
        t.type_name.as_deref().or(t.qualified_type_name.as_deref())
    })
}

fn signature<'a>(params: &'a [Param], type_name: impl Fn(&'a TypeStub) -> Option<&'a str>) -> String {
    let mut out = String::from("(");
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(type_name(&param.type_ref).unwrap_or(""));
        out.push_str(param.type_ref.dimension.as_deref().unwrap_or(""));
    }
    out.push(')');
    out
}

/// The identifier of a document relative to its library: the qualified
/// name, plus the qualified parameter signature for callable members.
pub fn relative_id(doc: &impl Identified) -> Option<String> {
    let qualified = doc.qualified()?;
    let callable = doc.meta_type().is_some_and(MetaType::is_callable);
    Some(if callable {
        format!("{qualified}{}", qualified_signature(doc.parameters()))
    } else {
        qualified.to_string()
    })
}

/// `libraryId + "/" + relative_id`.
pub fn build_id(library_id: &str, doc: &impl Identified) -> Option<String> {
    relative_id(doc).map(|rel| format!("{library_id}/{rel}"))
}
