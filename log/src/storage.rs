//! Log-specific storage wrapper.
//!
//! [`LogStorage`] wraps the substrate with typed operations on offset
//! markers and log entries, translating substrate errors into [`Error`].

use std::sync::Arc;

use bytes::Bytes;
use common::{CasOutcome, Record, Storage, WriteOptions};

use crate::error::Result;
use crate::model::{Message, Offset};
use crate::serde::{decode_message, decode_offset, encode_message, encode_offset, entry_key};

/// Typed access to log state held in the substrate.
///
/// Holds no state of its own: every call goes to the substrate, so nothing
/// is cached across requests.
#[derive(Clone)]
pub(crate) struct LogStorage {
    storage: Arc<dyn Storage>,
}

impl LogStorage {
    /// Creates a new log storage wrapper.
    pub(crate) fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Creates a new log storage with an in-memory backend.
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        use common::storage::in_memory::InMemoryStorage;
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    /// Reads an offset marker, returning `None` if it was never written.
    pub(crate) async fn read_marker(&self, marker: &Bytes) -> Result<Option<Offset>> {
        let record = self.storage.get(marker.clone()).await?;
        match record {
            Some(r) => Ok(Some(decode_offset(&r.value)?)),
            None => Ok(None),
        }
    }

    /// Replaces an offset marker if it still holds `expected`.
    ///
    /// `expected == None` creates the marker only if it is still absent.
    pub(crate) async fn swap_marker(
        &self,
        marker: &Bytes,
        expected: Option<Offset>,
        new: Offset,
    ) -> Result<CasOutcome> {
        let outcome = self
            .storage
            .compare_and_swap(
                marker.clone(),
                expected.map(encode_offset),
                encode_offset(new),
                true,
            )
            .await?;
        Ok(outcome)
    }

    /// Writes the entry at `offset` of `log_key`.
    pub(crate) async fn write_entry(
        &self,
        log_key: &str,
        offset: Offset,
        message: Message,
        options: WriteOptions,
    ) -> Result<()> {
        let record = Record::new(entry_key(log_key, offset), encode_message(message));
        self.storage.put_with_options(vec![record], options).await?;
        Ok(())
    }

    /// Reads the entry at `offset` of `log_key`, or `None` if no entry was
    /// written there.
    pub(crate) async fn read_entry(&self, log_key: &str, offset: Offset) -> Result<Option<Message>> {
        let record = self.storage.get(entry_key(log_key, offset)).await?;
        match record {
            Some(r) => Ok(Some(decode_message(&r.value)?)),
            None => Ok(None),
        }
    }

    /// Flushes and closes the substrate.
    pub(crate) async fn close(&self) -> Result<()> {
        self.storage.flush().await?;
        self.storage.close().await?;
        Ok(())
    }

    /// Writes a raw value, bypassing the typed encoders.
    #[cfg(test)]
    pub(crate) async fn put_raw(&self, key: Bytes, value: Bytes) -> Result<()> {
        self.storage.put(vec![Record::new(key, value)]).await?;
        Ok(())
    }
}
