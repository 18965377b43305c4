use std::collections::BTreeMap;
use std::ops::RangeBounds;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{RecordOp, Storage, WriteOptions};
use crate::{BytesRange, Record, StorageError, StorageIterator, StorageRead, StorageResult};

/// In-memory implementation of the Storage trait using a BTreeMap.
///
/// Useful for testing or scenarios where durability is not required. Batches
/// are applied under a single write lock, so they are atomic with respect to
/// concurrent readers.
#[derive(Default)]
pub struct InMemoryStorage {
    data: RwLock<BTreeMap<Bytes, Bytes>>,
}

impl InMemoryStorage {
    /// Creates a new InMemoryStorage instance with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(
        &self,
    ) -> StorageResult<std::sync::RwLockReadGuard<'_, BTreeMap<Bytes, Bytes>>> {
        self.data
            .read()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire read lock: {}", e)))
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self.read_lock()?;
        Ok(data.get(&key).map(|value| Record::new(key, value.clone())))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        let data = self.read_lock()?;
        let records: Vec<Record> = data
            .range((range.start_bound().cloned(), range.end_bound().cloned()))
            .map(|(k, v)| Record::new(k.clone(), v.clone()))
            .collect();

        Ok(Box::new(InMemoryIterator { records, index: 0 }))
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn last_in_range(&self, range: BytesRange) -> StorageResult<Option<Record>> {
        let data = self.read_lock()?;
        Ok(data
            .range((range.start_bound().cloned(), range.end_bound().cloned()))
            .next_back()
            .map(|(k, v)| Record::new(k.clone(), v.clone())))
    }
}

struct InMemoryIterator {
    records: Vec<Record>,
    index: usize,
}

#[async_trait]
impl StorageIterator for InMemoryIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        let record = self.records.get(self.index).cloned();
        if record.is_some() {
            self.index += 1;
        }
        Ok(record)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    /// Applies the batch under one write lock acquisition.
    ///
    /// Write options are ignored since there is no durable storage to await.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::Internal(format!("Failed to acquire write lock: {}", e)))?;

        for op in ops {
            match op {
                RecordOp::Put(record) => {
                    data.insert(record.key, record.value);
                }
                RecordOp::Delete(key) => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
