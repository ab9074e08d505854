use crate::doc::{ApiDoc, MemberStub, Param, TypeStub};

/// Anything the override-matching rule applies to: method documents and
/// the method stubs embedded in type documents.
pub trait MethodLike {
    fn method_name(&self) -> Option<&str>;
    fn method_params(&self) -> &[Param];
}

impl MethodLike for ApiDoc {
    fn method_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn method_params(&self) -> &[Param] {
        &self.parameters
    }
}

impl MethodLike for MemberStub {
    fn method_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn method_params(&self) -> &[Param] {
        &self.parameters
    }
}

/// Parameter-type match between a descendant's type and an ancestor's.
///
/// A single-character ancestor type name is treated as an unresolved
/// generic type variable and matches anything. An intentional
/// over-approximation: the variable's bounds are not checked.
pub fn type_matches(child: &TypeStub, ancestor: &TypeStub) -> bool {
    match (child.qualified(), ancestor.qualified()) {
        (Some(c), Some(a)) => c == a || a.len() == 1,
        (None, None) => true,
        _ => false,
    }
}

/// True if `child` overrides (or implements) `ancestor`: names match
/// exactly and parameter lists match in count and per-position type.
pub fn method_overrides(child: &impl MethodLike, ancestor: &impl MethodLike) -> bool {
    if child.method_name() != ancestor.method_name() || child.method_name().is_none() {
        return false;
    }
    let (cp, ap) = (child.method_params(), ancestor.method_params());
    cp.len() == ap.len()
        && cp
            .iter()
            .zip(ap)
            .all(|(c, a)| type_matches(&c.type_ref, &a.type_ref))
}

/// First method in `ancestors` that `child` overrides, if any.
pub fn find_overridden<'a>(
    child: &impl MethodLike,
    ancestors: &'a [MemberStub],
) -> Option<&'a MemberStub> {
    ancestors.iter().find(|a| method_overrides(child, *a))
}
