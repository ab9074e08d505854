//! # Apidex Index
//!
//! Derived search indexes over the document store.
//!
//! The reference name index is the resolution backbone: every pipeline
//! stage that must turn a symbolic qualified name into a concrete
//! document goes through it. The three `CustomIndex` implementations
//! answer one query shape each:
//!
//! - [`AutoCompleteIndex`] - "complete this partial name"
//! - [`KnownSubclassesIndex`] - "who immediately subclasses type Y"
//! - [`KnownImplementorsIndex`] - "which classes implement interface Y"
//!
//! Every index supports full rebuild, additive per-library add, and
//! per-library removal that leaves other libraries' entries intact.

mod autocomplete;
mod custom;
mod error;
mod implementors;
mod reference;
mod subclasses;
mod versioned;

pub use autocomplete::{AutoCompleteIndex, DEFAULT_QUERY_LIMIT};
pub use custom::{all_indexes, CustomIndex};
pub use error::{IndexError, Result};
pub use implementors::KnownImplementorsIndex;
pub use reference::{reference_names, RefEntry, ReferenceNameIndex};
pub use subclasses::KnownSubclassesIndex;
