//! # Apidex Store
//!
//! Multi-collection document store for the API knowledge base.
//!
//! ## Architecture
//!
//! ```text
//! DocStore (trait)
//!     │
//!     ├──> MemoryStore   - collection -> id -> document, RwLock'd
//!     ├──> FileStore     - same shape, one JSON file per collection
//!     │
//!     ├──> Filter        - dotted-path equality + $regex matching,
//!     │                    shared by both backends
//!     └──> BulkWriter    - staged upserts, threshold-triggered flush
//! ```
//!
//! Per-library collections are named by the library id itself
//! (`/language/name/version`); derived indexes live in their own
//! collections. The `libraries` collection holds one overview record per
//! library. Backends must tolerate concurrent readers while a build is in
//! progress; rebuilds are not transactional (spec'd behavior: a query
//! issued mid-rebuild may observe a partial index).

mod bulk;
mod error;
mod file;
mod filter;
mod memory;
mod store;

pub use bulk::{BulkWriter, DEFAULT_FLUSH_THRESHOLD};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use filter::{Filter, Match};
pub use memory::MemoryStore;
pub use store::{collection_of_id, doc_id, DocStore, Visitor, LIBRARY_COLLECTION};
