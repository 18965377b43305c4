//! Reads the current position of the store's sequence.

use std::sync::Arc;

use crate::error::Result;
use crate::model::RecordId;
use crate::store::{ContentStore, SequenceLock};

/// Reports the highest identifier the store has handed out.
///
/// The answer is the larger of the highest existing record (descending,
/// limit one) and the sequence high-water mark, so deleting the newest record
/// does not make an already issued identifier look free. An empty store
/// reports [`RecordId::NONE`].
#[derive(Clone)]
pub struct SequenceInspector {
    store: Arc<ContentStore>,
}

impl SequenceInspector {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    /// Point-in-time read of the current maximum.
    ///
    /// Nothing stops a concurrent insertion from moving the sequence right
    /// after this returns. Use [`current_max_locked`] when the answer must
    /// stay valid for a following write.
    ///
    /// [`current_max_locked`]: SequenceInspector::current_max_locked
    pub async fn current_max(&self) -> Result<RecordId> {
        let last = self.store.last_record_id().await?.unwrap_or(RecordId::NONE);
        let issued = self.store.max_identifier().await?;
        Ok(last.max(issued))
    }

    /// Current maximum read while holding the sequence lock.
    pub async fn current_max_locked(sequence: &SequenceLock<'_>) -> Result<RecordId> {
        let last = sequence.last_record_id().await?.unwrap_or(RecordId::NONE);
        let issued = sequence.max_identifier().await?;
        Ok(last.max(issued))
    }
}
