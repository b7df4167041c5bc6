//! Key-value substrate shared by the services in this workspace.
//!
//! The substrate is the only persistent, shared state a service relies on.
//! It offers linearizable single-key reads, plain writes, and an atomic
//! compare-and-swap with create-if-absent semantics. Coordination between
//! concurrent writers happens exclusively through [`Storage::compare_and_swap`].

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod slate;

use async_trait::async_trait;
use bytes::Bytes;

/// A single key-value pair stored in the substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Options for plain writes.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Whether to wait for the write to be durable before returning.
    pub await_durable: bool,
}

/// Result of a compare-and-swap attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored value matched the expectation and was replaced.
    Swapped,
    /// The stored value did not match; nothing was written.
    Conflict,
}

/// Errors returned by substrate backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend failed (I/O, object store, closed database, ...).
    Storage(String),
    /// A compare-and-swap targeted a missing key without create-if-absent.
    NotFound(Bytes),
    /// An invariant inside the backend was violated.
    Internal(String),
}

impl std::error::Error for StorageError {}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Storage(msg) => write!(f, "Storage error: {}", msg),
            StorageError::NotFound(key) => {
                write!(f, "Key not found: {}", String::from_utf8_lossy(key))
            }
            StorageError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StorageError {
    /// Wraps an error raised by a backend library.
    pub fn from_storage(err: impl std::fmt::Display) -> Self {
        StorageError::Storage(err.to_string())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Read half of the substrate.
#[async_trait]
pub trait StorageRead: Send + Sync {
    /// Retrieves a single record by key.
    ///
    /// Returns `None` if the key does not exist.
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>>;
}

/// Full substrate interface: reads, plain writes, and compare-and-swap.
#[async_trait]
pub trait Storage: StorageRead {
    /// Writes records unconditionally.
    async fn put(&self, records: Vec<Record>) -> StorageResult<()> {
        self.put_with_options(records, WriteOptions::default())
            .await
    }

    /// Writes records unconditionally with the given options.
    async fn put_with_options(
        &self,
        records: Vec<Record>,
        options: WriteOptions,
    ) -> StorageResult<()>;

    /// Atomically replaces the value under `key` if it currently equals
    /// `expected`.
    ///
    /// `expected == None` means "the key must be absent", which can only
    /// succeed when `create_if_absent` is set. Against a missing key without
    /// `create_if_absent` this returns [`StorageError::NotFound`].
    async fn compare_and_swap(
        &self,
        key: Bytes,
        expected: Option<Bytes>,
        new: Bytes,
        create_if_absent: bool,
    ) -> StorageResult<CasOutcome>;

    /// Flushes buffered writes to durable storage.
    async fn flush(&self) -> StorageResult<()>;

    /// Closes the backend. Subsequent operations may fail.
    async fn close(&self) -> StorageResult<()>;
}

/// Decides a compare-and-swap against the currently stored value.
///
/// Shared by backends so that every implementation agrees on the
/// create-if-absent rules.
pub(crate) fn cas_decision(
    key: &Bytes,
    current: Option<&Bytes>,
    expected: Option<&Bytes>,
    create_if_absent: bool,
) -> StorageResult<CasOutcome> {
    match (current, expected) {
        (Some(current), Some(expected)) if current == expected => Ok(CasOutcome::Swapped),
        (Some(_), _) => Ok(CasOutcome::Conflict),
        (None, _) if !create_if_absent => Err(StorageError::NotFound(key.clone())),
        (None, None) => Ok(CasOutcome::Swapped),
        (None, Some(_)) => Ok(CasOutcome::Conflict),
    }
}
