//! SlateDB-backed implementation of the storage traits.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use slatedb::{Db, WriteBatch};

use super::{RecordOp, Storage, WriteOptions};
use crate::{BytesRange, Record, StorageError, StorageIterator, StorageRead, StorageResult};

/// Storage backed by a SlateDB database.
pub struct SlateDbStorage {
    db: Arc<Db>,
}

impl SlateDbStorage {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StorageRead for SlateDbStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let value = self
            .db
            .get(&key)
            .await
            .map_err(StorageError::from_storage)?;
        Ok(value.map(|value| Record::new(key, value)))
    }

    /// Drains the SlateDB iterator eagerly so the returned iterator owns its
    /// records and does not borrow the database.
    #[tracing::instrument(level = "trace", skip_all)]
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + 'static>> {
        let mut iter = self
            .db
            .scan(range)
            .await
            .map_err(StorageError::from_storage)?;
        let mut records = Vec::new();
        while let Some(kv) = iter.next().await.map_err(StorageError::from_storage)? {
            records.push(Record::new(kv.key, kv.value));
        }
        Ok(Box::new(CollectedIterator {
            records: records.into_iter(),
        }))
    }
}

struct CollectedIterator {
    records: std::vec::IntoIter<Record>,
}

#[async_trait]
impl StorageIterator for CollectedIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        Ok(self.records.next())
    }
}

#[async_trait]
impl Storage for SlateDbStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn apply_with_options(
        &self,
        ops: Vec<RecordOp>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        let mut batch = WriteBatch::new();
        for op in ops {
            match op {
                RecordOp::Put(record) => batch.put(&record.key, &record.value),
                RecordOp::Delete(key) => batch.delete(&key),
            }
        }

        let mut write_options = slatedb::config::WriteOptions::default();
        write_options.await_durable = options.await_durable;
        self.db
            .write_with_options(batch, &write_options)
            .await
            .map_err(StorageError::from_storage)
    }

    async fn flush(&self) -> StorageResult<()> {
        self.db.flush().await.map_err(StorageError::from_storage)
    }

    async fn close(&self) -> StorageResult<()> {
        self.db.close().await.map_err(StorageError::from_storage)
    }
}
