//! # Apidex Pipeline
//!
//! Post-ingestion resolution over loaded libraries.
//!
//! Raw per-library records arrive with purely symbolic references. The
//! four stages here, run in fixed dependency order by
//! [`PostProcessor`], turn them into a resolved cross-library graph:
//!
//! 1. [`SetStubIds`] - stamp ids on provably same-library stubs
//! 2. [`CollectSuperclasses`] - `_superclasses`/`_interfaces` across
//!    library boundaries
//! 3. [`CollectInheritedMembers`] - `_inherited` segments
//! 4. [`LinkOverriddenMethods`] - `_overrides`/`_implements`
//!
//! Every stage is idempotent: re-running a stage over an unchanged
//! library produces the same documents. The [`tasks`] module bundles
//! the admin operations (add a library everywhere, rebuild all
//! indexes, remove a library everywhere).

mod error;
mod inherited;
mod overrides;
mod post_processor;
mod stub_ids;
mod superclasses;
pub mod tasks;

pub use error::{PipelineError, Result};
pub use inherited::CollectInheritedMembers;
pub use overrides::LinkOverriddenMethods;
pub use post_processor::PostProcessor;
pub use stub_ids::SetStubIds;
pub use superclasses::CollectSuperclasses;
