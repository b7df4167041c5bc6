use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use slatedb::config::WriteOptions as SlateDbWriteOptions;
use slatedb::{Db, WriteBatch};
use tokio::sync::{Mutex, MutexGuard};

use super::{
    CasOutcome, Record, Storage, StorageError, StorageRead, StorageResult, WriteOptions,
    cas_decision,
};

/// Number of lock stripes guarding writes.
const LOCK_STRIPES: usize = 64;

/// SlateDB-backed implementation of the Storage trait.
///
/// SlateDB is an embedded key-value store built on object storage. It
/// admits a single writer process, so compare-and-swap is made atomic
/// in-process: every write to a key holds that key's stripe lock, and a
/// compare-and-swap reads and writes under the same lock. Keys on different
/// stripes proceed independently.
pub struct SlateDbStorage {
    db: Arc<Db>,
    stripes: Vec<Mutex<()>>,
}

impl SlateDbStorage {
    /// Creates a new SlateDbStorage wrapping the given SlateDB database.
    pub fn new(db: Arc<Db>) -> Self {
        Self {
            db,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe_index(key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % LOCK_STRIPES
    }

    /// Locks the stripes covering `keys` in ascending order.
    async fn lock_stripes(&self, keys: impl Iterator<Item = &Bytes>) -> Vec<MutexGuard<'_, ()>> {
        let mut indexes: Vec<usize> = keys.map(|k| Self::stripe_index(k)).collect();
        indexes.sort_unstable();
        indexes.dedup();
        let mut guards = Vec::with_capacity(indexes.len());
        for index in indexes {
            guards.push(self.stripes[index].lock().await);
        }
        guards
    }

    async fn write_batch(&self, records: Vec<Record>, options: &WriteOptions) -> StorageResult<()> {
        let mut batch = WriteBatch::new();
        for record in records {
            batch.put(record.key, record.value);
        }
        let slate_options = SlateDbWriteOptions {
            await_durable: options.await_durable,
            ..Default::default()
        };
        self.db
            .write_with_options(batch, &slate_options)
            .await
            .map_err(StorageError::from_storage)
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

        match value {
            Some(v) => Ok(Some(Record::new(key, v))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Storage for SlateDbStorage {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        options: WriteOptions,
    ) -> StorageResult<()> {
        let _guards = self.lock_stripes(records.iter().map(|r| &r.key)).await;
        self.write_batch(records, &options).await
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn compare_and_swap(
        &self,
        key: Bytes,
        expected: Option<Bytes>,
        new: Bytes,
        create_if_absent: bool,
    ) -> StorageResult<CasOutcome> {
        let _guard = self.stripes[Self::stripe_index(&key)].lock().await;
        let current = self
            .db
            .get(&key)
            .await
            .map_err(StorageError::from_storage)?;
        let outcome = cas_decision(&key, current.as_ref(), expected.as_ref(), create_if_absent)?;
        if outcome == CasOutcome::Swapped {
            self.write_batch(vec![Record::new(key, new)], &WriteOptions::default())
                .await?;
        }
        Ok(outcome)
    }

    async fn flush(&self) -> StorageResult<()> {
        self.db.flush().await.map_err(StorageError::from_storage)?;
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.db.close().await.map_err(StorageError::from_storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use slatedb::DbBuilder;
    use slatedb::object_store::memory::InMemory;

    use super::*;

    async fn open_storage() -> SlateDbStorage {
        let db = DbBuilder::new("slate-test", Arc::new(InMemory::new()))
            .build()
            .await
            .unwrap();
        SlateDbStorage::new(Arc::new(db))
    }

    #[tokio::test]
    async fn should_read_back_put_records() {
        // given
        let storage = open_storage().await;
        storage
            .put(vec![
                Record::new(Bytes::from("a"), Bytes::from("1")),
                Record::new(Bytes::from("b"), Bytes::from("2")),
            ])
            .await
            .unwrap();

        // when
        let a = storage.get(Bytes::from("a")).await.unwrap();
        let b = storage.get(Bytes::from("b")).await.unwrap();

        // then
        assert_eq!(a.unwrap().value, Bytes::from("1"));
        assert_eq!(b.unwrap().value, Bytes::from("2"));
    }

    #[tokio::test]
    async fn should_swap_only_when_expected_value_matches() {
        // given
        let storage = open_storage().await;
        let key = Bytes::from("marker");
        storage
            .compare_and_swap(key.clone(), None, Bytes::from("1"), true)
            .await
            .unwrap();

        // when
        let stale = storage
            .compare_and_swap(key.clone(), None, Bytes::from("9"), true)
            .await
            .unwrap();
        let fresh = storage
            .compare_and_swap(key.clone(), Some(Bytes::from("1")), Bytes::from("2"), true)
            .await
            .unwrap();

        // then
        assert_eq!(stale, CasOutcome::Conflict);
        assert_eq!(fresh, CasOutcome::Swapped);
        let record = storage.get(key).await.unwrap().unwrap();
        assert_eq!(record.value, Bytes::from("2"));
    }

    #[tokio::test]
    async fn should_report_not_found_without_create_if_absent() {
        // given
        let storage = open_storage().await;

        // when
        let result = storage
            .compare_and_swap(Bytes::from("missing"), None, Bytes::from("1"), false)
            .await;

        // then
        assert_eq!(result, Err(StorageError::NotFound(Bytes::from("missing"))));
    }

    #[test]
    fn should_map_same_key_to_same_stripe() {
        // given
        let key = b"orders/highest_offset";

        // when
        let first = SlateDbStorage::stripe_index(key);
        let second = SlateDbStorage::stripe_index(key);

        // then
        assert_eq!(first, second);
        assert!(first < LOCK_STRIPES);
    }
}
