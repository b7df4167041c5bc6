//! Entry writes at allocated offsets.

use common::WriteOptions as StorageWriteOptions;

use crate::config::WriteOptions;
use crate::error::Result;
use crate::model::{Message, Offset};
use crate::storage::LogStorage;

/// Writes log entries under `<logKey>/data/<offset>`.
///
/// Callers must pass an offset obtained from the
/// [`OffsetAllocator`](crate::allocator::OffsetAllocator) for the same key.
/// Exclusive allocation means at most one writer ever targets a given entry
/// key, so a plain write suffices.
#[derive(Clone)]
pub(crate) struct LogWriter {
    storage: LogStorage,
}

impl LogWriter {
    pub(crate) fn new(storage: LogStorage) -> Self {
        Self { storage }
    }

    pub(crate) async fn append(
        &self,
        log_key: &str,
        offset: Offset,
        message: Message,
        options: &WriteOptions,
    ) -> Result<()> {
        let storage_options = StorageWriteOptions {
            await_durable: options.await_durable,
        };
        self.storage
            .write_entry(log_key, offset, message, storage_options)
            .await
    }
}
