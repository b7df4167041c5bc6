//! The commit log entry point.
//!
//! This module provides [`CommitLog`], which ties together offset
//! allocation, entry writes, range reads, and commit tracking over a
//! shared substrate.

use std::collections::HashMap;

use common::storage::factory::create_storage;

use crate::allocator::OffsetAllocator;
use crate::commit::CommitTracker;
use crate::config::{Config, WriteOptions};
use crate::error::{Error, Result};
use crate::model::{LogEntry, Message, Offset};
use crate::reader::PollEngine;
use crate::storage::LogStorage;
use crate::writer::LogWriter;

/// A replicated, append-only log service over a key-value substrate.
///
/// Each log key names an independent log. Logs are created lazily by the
/// first append and are never deleted.
///
/// # Concurrency
///
/// `CommitLog` holds no locks and caches nothing: all coordination happens
/// through compare-and-swap on substrate markers. Any number of tasks, and
/// any number of processes sharing the substrate, may call it concurrently.
/// Offsets of a single key are totally ordered by allocation; there is no
/// ordering across keys.
///
/// # Example
///
/// ```ignore
/// use std::collections::HashMap;
/// use commitlog::{CommitLog, Config};
///
/// let log = CommitLog::open(Config::default()).await?;
///
/// let offset = log.send("orders", 42).await?;
/// let msgs = log.poll(HashMap::from([("orders".to_string(), offset)])).await?;
/// log.commit_offsets(HashMap::from([("orders".to_string(), offset)])).await?;
/// ```
pub struct CommitLog {
    storage: LogStorage,
    allocator: OffsetAllocator,
    writer: LogWriter,
    reader: PollEngine,
    commits: CommitTracker,
}

impl CommitLog {
    /// Opens a commit log with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `poll_batch_size` is zero, or a
    /// storage error if the backend cannot be initialized.
    pub async fn open(config: Config) -> Result<Self> {
        if config.poll_batch_size == 0 {
            return Err(Error::InvalidInput(
                "poll_batch_size must be greater than zero".to_string(),
            ));
        }
        let storage = create_storage(&config.storage).await?;
        Ok(Self::with_storage(LogStorage::new(storage), config))
    }

    fn with_storage(storage: LogStorage, config: Config) -> Self {
        Self {
            allocator: OffsetAllocator::new(
                storage.clone(),
                config.retry.clone(),
                config.start_offset,
            ),
            writer: LogWriter::new(storage.clone()),
            reader: PollEngine::new(storage.clone(), config.poll_batch_size, config.start_offset),
            commits: CommitTracker::new(storage.clone(), config.retry),
            storage,
        }
    }

    /// Creates a commit log over an existing substrate.
    #[cfg(test)]
    pub(crate) fn new(storage: std::sync::Arc<dyn common::Storage>, config: Config) -> Self {
        Self::with_storage(LogStorage::new(storage), config)
    }

    /// Appends `message` to the log named `key` and returns its offset.
    pub async fn send(&self, key: &str, message: Message) -> Result<Offset> {
        self.send_with_options(key, message, WriteOptions::default())
            .await
    }

    /// Appends `message` to the log named `key` with custom options.
    ///
    /// If the entry write fails after the offset was allocated, the offset
    /// stays unused and polls skip over it.
    pub async fn send_with_options(
        &self,
        key: &str,
        message: Message,
        options: WriteOptions,
    ) -> Result<Offset> {
        let offset = self.allocator.allocate(key).await?;
        self.writer.append(key, offset, message, &options).await?;
        tracing::trace!(key, offset, "appended message");
        Ok(offset)
    }

    /// Reads up to the configured batch of entries per key, starting at the
    /// requested offset of each key.
    ///
    /// Every requested key is present in the result; keys with nothing to
    /// return map to an empty sequence.
    pub async fn poll(
        &self,
        offsets: HashMap<String, Offset>,
    ) -> Result<HashMap<String, Vec<LogEntry>>> {
        self.reader.poll(offsets).await
    }

    /// Raises the committed offset of each key to at least the given value.
    pub async fn commit_offsets(&self, offsets: HashMap<String, Offset>) -> Result<()> {
        self.commits.commit_all(offsets).await
    }

    /// Returns the committed offsets of `keys`, omitting keys that were
    /// never committed.
    pub async fn list_committed_offsets(&self, keys: &[String]) -> Result<HashMap<String, Offset>> {
        self.commits.list_committed(keys).await
    }

    /// Returns the highest offset allocated for `key`, if any.
    pub async fn highest_offset(&self, key: &str) -> Result<Option<Offset>> {
        self.allocator.highest(key).await
    }

    /// Flushes and closes the underlying substrate.
    pub async fn close(&self) -> Result<()> {
        self.storage.close().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use common::storage::in_memory::InMemoryStorage;
    use common::{
        CasOutcome, Record, Storage, StorageConfig, StorageError, StorageRead, StorageResult,
        WriteOptions as StorageWriteOptions,
    };

    use super::*;

    fn test_config() -> Config {
        Config {
            storage: StorageConfig::InMemory,
            ..Default::default()
        }
    }

    /// Substrate that accepts markers but fails every entry write.
    struct FailingEntryWrites {
        inner: InMemoryStorage,
    }

    #[async_trait]
    impl StorageRead for FailingEntryWrites {
        async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
            self.inner.get(key).await
        }
    }

    #[async_trait]
    impl Storage for FailingEntryWrites {
        async fn put_with_options(
            &self,
            _records: Vec<Record>,
            _options: StorageWriteOptions,
        ) -> StorageResult<()> {
            Err(StorageError::Storage("disk full".to_string()))
        }

        async fn compare_and_swap(
            &self,
            key: Bytes,
            expected: Option<Bytes>,
            new: Bytes,
            create_if_absent: bool,
        ) -> StorageResult<CasOutcome> {
            self.inner
                .compare_and_swap(key, expected, new, create_if_absent)
                .await
        }

        async fn flush(&self) -> StorageResult<()> {
            Ok(())
        }

        async fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn should_open_log_with_in_memory_config() {
        // given
        let config = test_config();

        // when
        let result = CommitLog::open(config).await;

        // then
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_reject_zero_poll_batch_size() {
        // given
        let config = Config {
            poll_batch_size: 0,
            ..test_config()
        };

        // when
        let result = CommitLog::open(config).await;

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn should_send_and_poll_message() {
        // given
        let log = CommitLog::open(test_config()).await.unwrap();

        // when
        let offset = log.send("x", 10).await.unwrap();
        let msgs = log
            .poll(HashMap::from([("x".to_string(), 0)]))
            .await
            .unwrap();

        // then
        assert_eq!(offset, 1000);
        assert_eq!(msgs["x"], vec![LogEntry::new(1000, 10)]);
    }

    #[tokio::test]
    async fn should_honor_configured_start_offset_and_batch_size() {
        // given
        let log = CommitLog::open(Config {
            start_offset: 0,
            poll_batch_size: 1,
            ..test_config()
        })
        .await
        .unwrap();
        log.send("x", 1).await.unwrap();
        log.send("x", 2).await.unwrap();

        // when
        let msgs = log
            .poll(HashMap::from([("x".to_string(), 0)]))
            .await
            .unwrap();

        // then
        assert_eq!(msgs["x"], vec![LogEntry::new(0, 1)]);
        assert_eq!(log.highest_offset("x").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn should_propagate_entry_write_failure_and_leave_gap() {
        // given
        let substrate = Arc::new(FailingEntryWrites {
            inner: InMemoryStorage::new(),
        });
        let log = CommitLog::new(substrate, test_config());

        // when
        let result = log.send("x", 10).await;

        // then - the offset was consumed but nothing is readable
        assert_eq!(result, Err(Error::Storage("disk full".to_string())));
        assert_eq!(log.highest_offset("x").await.unwrap(), Some(1000));
        let msgs = log
            .poll(HashMap::from([("x".to_string(), 0)]))
            .await
            .unwrap();
        assert!(msgs["x"].is_empty());
    }

    #[tokio::test]
    async fn should_close_log() {
        // given
        let log = CommitLog::open(test_config()).await.unwrap();

        // when
        let result = log.close().await;

        // then
        assert!(result.is_ok());
    }
}
