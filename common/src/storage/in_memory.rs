//! In-process storage backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    CasOutcome, Record, Storage, StorageError, StorageRead, StorageResult, WriteOptions,
    cas_decision,
};

/// In-memory implementation of [`Storage`].
///
/// All operations go through one `RwLock`, which makes every read,
/// write, and compare-and-swap linearizable within the process. Data is
/// lost when the value is dropped.
#[derive(Default)]
pub struct InMemoryStorage {
    data: RwLock<BTreeMap<Bytes, Bytes>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StorageError {
        StorageError::Internal("in-memory storage lock poisoned".to_string())
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self.data.read().map_err(|_| Self::poisoned())?;
        Ok(data.get(&key).map(|value| Record::new(key, value.clone())))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        _options: WriteOptions,
    ) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| Self::poisoned())?;
        for record in records {
            data.insert(record.key, record.value);
        }
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: Bytes,
        expected: Option<Bytes>,
        new: Bytes,
        create_if_absent: bool,
    ) -> StorageResult<CasOutcome> {
        let mut data = self.data.write().map_err(|_| Self::poisoned())?;
        let outcome = cas_decision(&key, data.get(&key), expected.as_ref(), create_if_absent)?;
        if outcome == CasOutcome::Swapped {
            data.insert(key, new);
        }
        Ok(outcome)
    }

    async fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
