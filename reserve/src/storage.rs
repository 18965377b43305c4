//! Content-specific storage wrappers.
//!
//! [`ContentStorage`] and [`ContentStorageRead`] wrap the generic storage
//! traits with record and sequence encoding.

use std::sync::Arc;

use common::{Record, RecordOp, Storage, StorageRead};

use crate::error::Result;
use crate::model::{ContentRecord, RecordId};
use crate::serde::{
    decode_record_key, decode_record_value, decode_sequence_value, encode_record_key,
    encode_record_value, encode_sequence_value, record_key_range, sequence_key,
};

/// Read-only content storage operations.
#[derive(Clone)]
pub(crate) struct ContentStorageRead {
    storage: Arc<dyn StorageRead>,
}

impl ContentStorageRead {
    pub(crate) fn new(storage: Arc<dyn StorageRead>) -> Self {
        Self { storage }
    }

    pub(crate) async fn get_record(&self, id: RecordId) -> Result<Option<ContentRecord>> {
        match self.storage.get(encode_record_key(id)).await? {
            Some(record) => Ok(Some(decode_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Highest identifier among existing records: descending, limit one.
    pub(crate) async fn last_record_id(&self) -> Result<Option<RecordId>> {
        match self.storage.last_in_range(record_key_range()).await? {
            Some(record) => Ok(Some(decode_record_key(&record.key)?)),
            None => Ok(None),
        }
    }

    /// The persisted next identifier, if the sequence record exists.
    pub(crate) async fn sequence_next(&self) -> Result<Option<RecordId>> {
        match self.storage.get(sequence_key()).await? {
            Some(record) => Ok(Some(decode_sequence_value(&record.value)?)),
            None => Ok(None),
        }
    }

    /// All records in ascending identifier order.
    pub(crate) async fn records(&self) -> Result<Vec<ContentRecord>> {
        let records = self.storage.scan(record_key_range()).await?;
        records.iter().map(decode_record).collect()
    }
}

fn decode_record(record: &Record) -> Result<ContentRecord> {
    Ok(ContentRecord {
        id: decode_record_key(&record.key)?,
        fields: decode_record_value(&record.value)?,
    })
}

/// Read-write content storage operations.
#[derive(Clone)]
pub(crate) struct ContentStorage {
    storage: Arc<dyn Storage>,
}

impl ContentStorage {
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        use common::storage::in_memory::InMemoryStorage;
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    pub(crate) fn as_read(&self) -> ContentStorageRead {
        ContentStorageRead::new(Arc::clone(&self.storage) as Arc<dyn StorageRead>)
    }

    /// Writes a record together with the advanced sequence in one batch.
    pub(crate) async fn write_record(&self, record: &ContentRecord, next: RecordId) -> Result<()> {
        let ops = vec![
            RecordOp::Put(Record::new(
                encode_record_key(record.id),
                encode_record_value(&record.fields)?,
            )),
            RecordOp::Put(Record::new(sequence_key(), encode_sequence_value(next))),
        ];
        self.storage.apply(ops).await?;
        Ok(())
    }

    /// Deletes records in one batch. Missing identifiers are ignored and the
    /// sequence record is left untouched.
    pub(crate) async fn delete_records(&self, ids: &[RecordId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ops = ids
            .iter()
            .map(|id| RecordOp::Delete(encode_record_key(*id)))
            .collect();
        self.storage.apply(ops).await?;
        Ok(())
    }

    pub(crate) async fn flush(&self) -> Result<()> {
        self.storage.flush().await?;
        Ok(())
    }

    pub(crate) async fn close(&self) -> Result<()> {
        self.storage.close().await?;
        Ok(())
    }
}
