//! The content store and its auto-increment sequence.

use std::sync::Arc;

use common::Storage;
use common::storage::factory::create_storage;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{ContentRecord, RecordFields, RecordId, RecordStatus};
use crate::storage::ContentStorage;

/// A content store whose records receive identifiers from a monotonic
/// sequence.
///
/// The store owns the sequence. Every insertion goes through the sequence
/// lock, which is also handed out to callers (see [`lock_sequence`]) that need
/// to read the sequence and insert without anything slipping in between.
///
/// # Identifier assignment
///
/// An insertion may carry an identifier hint. The hint is honored when it is
/// at or beyond the next sequence value, which guarantees it was never issued.
/// Otherwise the store ignores it and assigns the next sequence value. Either
/// way the sequence advances past the assigned identifier and never moves
/// back, so deleted identifiers are not reused.
///
/// [`lock_sequence`]: ContentStore::lock_sequence
pub struct ContentStore {
    storage: ContentStorage,
    sequence: Mutex<()>,
}

impl ContentStore {
    /// Opens a content store on the configured storage backend.
    pub async fn open(config: &common::StorageConfig) -> Result<Self> {
        let storage = create_storage(config)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Self::with_storage(storage))
    }

    /// Creates a content store on an existing storage implementation.
    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: ContentStorage::new(storage),
            sequence: Mutex::new(()),
        }
    }

    /// Acquires the advisory lock scoped to the sequence.
    ///
    /// While the returned guard is alive no other insertion through this
    /// store can run.
    pub async fn lock_sequence(&self) -> SequenceLock<'_> {
        SequenceLock {
            store: self,
            _guard: self.sequence.lock().await,
        }
    }

    /// Inserts a record and returns the identifier the sequence assigned.
    pub async fn insert_record(
        &self,
        fields: RecordFields,
        hint: Option<RecordId>,
    ) -> Result<RecordId> {
        self.lock_sequence()
            .await
            .insert_record(fields, hint)
            .await
    }

    pub async fn get_record(&self, id: RecordId) -> Result<Option<ContentRecord>> {
        self.storage.as_read().get_record(id).await
    }

    /// Deletes a record. No-op if it does not exist.
    pub async fn delete_record(&self, id: RecordId) -> Result<()> {
        self.storage.delete_records(&[id]).await
    }

    /// All records in ascending identifier order, whatever their status.
    pub async fn records(&self) -> Result<Vec<ContentRecord>> {
        self.storage.as_read().records().await
    }

    /// Records visible in published listings.
    pub async fn published(&self) -> Result<Vec<ContentRecord>> {
        let mut records = self.records().await?;
        records.retain(|r| r.fields.status.is_published());
        Ok(records)
    }

    /// Highest identifier the sequence has issued, or [`RecordId::NONE`].
    pub async fn max_identifier(&self) -> Result<RecordId> {
        Ok(next_id(&self.storage).await?.saturating_prev())
    }

    /// Highest identifier among records that currently exist.
    pub async fn last_record_id(&self) -> Result<Option<RecordId>> {
        self.storage.as_read().last_record_id().await
    }

    /// Flushes pending writes to durable storage.
    pub async fn flush(&self) -> Result<()> {
        self.storage.flush().await
    }

    /// Closes the store, releasing resources.
    pub async fn close(self) -> Result<()> {
        self.storage.close().await
    }
}

/// Exclusive access to the store's sequence.
///
/// Obtained from [`ContentStore::lock_sequence`]; released on drop.
pub struct SequenceLock<'a> {
    store: &'a ContentStore,
    _guard: MutexGuard<'a, ()>,
}

impl SequenceLock<'_> {
    /// The identifier the next insertion without a usable hint will receive.
    pub async fn next_id(&self) -> Result<RecordId> {
        next_id(&self.store.storage).await
    }

    /// Highest identifier the sequence has issued, or [`RecordId::NONE`].
    pub async fn max_identifier(&self) -> Result<RecordId> {
        Ok(self.next_id().await?.saturating_prev())
    }

    /// Highest identifier among records that currently exist.
    pub async fn last_record_id(&self) -> Result<Option<RecordId>> {
        self.store.last_record_id().await
    }

    /// Number of records currently in `status`.
    pub async fn count_with_status(&self, status: RecordStatus) -> Result<usize> {
        let records = self.store.records().await?;
        Ok(records.iter().filter(|r| r.fields.status == status).count())
    }

    /// Inserts a record; see [`ContentStore`] for how the identifier is chosen.
    pub async fn insert_record(
        &self,
        fields: RecordFields,
        hint: Option<RecordId>,
    ) -> Result<RecordId> {
        let next = self.next_id().await?;
        let assigned = match hint.filter(|h| *h != RecordId::NONE) {
            Some(hint) if hint >= next => hint,
            Some(hint) => {
                debug!(%hint, %next, "ignoring identifier hint behind the sequence");
                next
            }
            None => next,
        };
        let advanced = assigned
            .checked_next()
            .ok_or_else(|| Error::InvalidInput("identifier space exhausted".to_string()))?;

        let record = ContentRecord {
            id: assigned,
            fields,
        };
        self.store.storage.write_record(&record, advanced).await?;
        debug!(id = %assigned, next = %advanced, "inserted record");
        Ok(assigned)
    }

    /// Deletes records in one atomic batch. The sequence is not rewound.
    pub async fn delete_records(&self, ids: &[RecordId]) -> Result<()> {
        self.store.storage.delete_records(ids).await
    }
}

/// Next identifier.
///
/// Every insertion writes the record and the advanced sequence in one batch,
/// so a persisted sequence value is always past every record and is used as
/// is. Only a store without a sequence record falls back to the highest
/// existing record.
async fn next_id(storage: &ContentStorage) -> Result<RecordId> {
    let read = storage.as_read();
    if let Some(stored) = read.sequence_next().await? {
        return Ok(stored);
    }
    match read.last_record_id().await? {
        Some(last) => last
            .checked_next()
            .ok_or_else(|| Error::Internal(format!("record id {} has no successor", last))),
        None => Ok(RecordId::FIRST),
    }
}
