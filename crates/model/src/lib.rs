//! # Apidex Model
//!
//! Typed document model for the API knowledge base.
//!
//! Every record in the store describes one package, type, or member of a
//! versioned library. This crate defines:
//!
//! - **Library identity** - `LibraryId` parsing/rendering, version
//!   comparison, latest-version filtering
//! - **Documents and stubs** - [`ApiDoc`] (full record, tagged by
//!   [`MetaType`]) and the partial references embedded inside it
//!   ([`TypeStub`], [`MemberStub`])
//! - **Deterministic IDs** - `relative_id`/`build_id`, parameter
//!   signatures used to disambiguate overloaded members
//! - **Override matching** - the signature-equality rule shared by the
//!   inherited-member collector and the override/implements linker
//!
//! Unknown extractor fields are preserved through `#[serde(flatten)]`
//! maps so post-processing stages can mutate documents in place without
//! dropping data they do not model.

mod doc;
mod error;
mod identity;
mod library;
mod overrides;

pub use doc::{
    ApiDoc, InheritedMethods, InheritedSegment, MemberRef, MemberStub, MetaType, Param, TypeStub,
};
pub use error::{ModelError, Result};
pub use identity::{build_id, qualified_signature, relative_id, simple_signature, Identified};
pub use library::{latest_versions_only, LibraryId};
pub use overrides::{find_overridden, method_overrides, type_matches, MethodLike};
