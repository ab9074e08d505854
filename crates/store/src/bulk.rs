use crate::error::Result;
use crate::store::DocStore;
use serde_json::Value;

/// Staged documents before an automatic flush.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1000;

/// Batches inserts into a single collection and hands them to the
/// store in chunks.
///
/// Callers must [`flush`](BulkWriter::flush) before dropping; a drop
/// with staged documents only logs a warning, because `Drop` cannot
/// surface the I/O error.
pub struct BulkWriter<'a> {
    store: &'a dyn DocStore,
    collection: String,
    staged: Vec<Value>,
    threshold: usize,
}

impl<'a> BulkWriter<'a> {
    pub fn new(store: &'a dyn DocStore, collection: impl Into<String>) -> Self {
        BulkWriter {
            store,
            collection: collection.into(),
            staged: Vec::new(),
            threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn insert(&mut self, doc: Value) -> Result<()> {
        self.staged.push(doc);
        if self.staged.len() >= self.threshold {
            self.flush()?;
        }
        Ok(())
    }

    pub fn insert_all(&mut self, docs: Vec<Value>) -> Result<()> {
        for doc in docs {
            self.insert(doc)?;
        }
        Ok(())
    }

    /// Insert, logging the failure instead of propagating it. Used by
    /// index builders where one malformed document should not abort a
    /// whole library.
    pub fn safe_insert(&mut self, doc: Value) {
        if let Err(e) = self.insert(doc) {
            log::error!("Dropped document for collection {}: {e}", self.collection);
        }
    }

    pub fn safe_insert_all(&mut self, docs: Vec<Value>) {
        for doc in docs {
            self.safe_insert(doc);
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let staged = std::mem::take(&mut self.staged);
        self.store.save_all(&self.collection, staged)
    }
}

impl Drop for BulkWriter<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            log::warn!(
                "BulkWriter for {} dropped with {} unflushed documents",
                self.collection,
                self.staged.len()
            );
        }
    }
}
