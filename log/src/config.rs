//! Configuration options for the commit log.
//!
//! This module defines the configuration structs that control storage
//! setup, offset numbering, poll batching, and compare-and-swap retries.

use std::time::Duration;

use common::StorageConfig;

/// Offset assigned to the first entry of every log.
pub const DEFAULT_START_OFFSET: u64 = 1000;

/// Maximum number of entries returned per key by a single poll.
pub const DEFAULT_POLL_BATCH_SIZE: usize = 3;

/// Configuration for opening a [`CommitLog`](crate::CommitLog).
///
/// # Example
///
/// ```ignore
/// use commitlog::{CommitLog, Config};
/// use common::StorageConfig;
///
/// let config = Config {
///     storage: StorageConfig::InMemory,
///     ..Default::default()
/// };
/// let log = CommitLog::open(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend configuration.
    ///
    /// Determines where log state is persisted. See [`StorageConfig`] for
    /// the in-memory and SlateDB backends.
    pub storage: StorageConfig,

    /// Retry behavior for compare-and-swap conflicts.
    pub retry: RetryConfig,

    /// Offset of the first entry appended to any log key.
    pub start_offset: u64,

    /// Maximum entries returned per key by a poll. Must be non-zero.
    pub poll_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            retry: RetryConfig::default(),
            start_offset: DEFAULT_START_OFFSET,
            poll_batch_size: DEFAULT_POLL_BATCH_SIZE,
        }
    }
}

/// Backoff and deadline for compare-and-swap retry loops.
///
/// After every conflict the loop sleeps a random delay in
/// `[0, backoff]`, then doubles `backoff` up to `max_backoff`. Once
/// `timeout` has elapsed since the first attempt, the operation fails with
/// [`Error::Contention`](crate::Error::Contention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Upper bound of the first jittered sleep.
    pub initial_backoff: Duration,

    /// Cap on the backoff upper bound.
    pub max_backoff: Duration,

    /// Deadline for the whole retry loop.
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(100),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Options for append operations.
///
/// Controls the durability of [`CommitLog::send_with_options`](crate::CommitLog::send_with_options).
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Whether to wait for the entry to be durable before returning.
    ///
    /// When `false` (the default), the append returns once the substrate
    /// has accepted the write, which may precede durability on backends
    /// that buffer writes.
    pub await_durable: bool,
}
