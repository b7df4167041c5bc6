//! Bounded range reads over one or more logs.

use std::collections::HashMap;

use futures::future::try_join_all;

use crate::error::{Error, Result};
use crate::model::{LogEntry, Offset};
use crate::serde::highest_offset_key;
use crate::storage::LogStorage;

/// Reads up to `batch_size` entries per key at or above a start offset.
///
/// For each key the engine reads the highest-offset marker, then probes
/// entry keys in ascending order up to that marker. Offsets with no entry
/// are skipped: they belong to appends that allocated an offset but failed
/// before writing it. The cost per key is bounded by
/// `highest - start + 1` substrate reads.
///
/// No offset below the configured start offset is ever allocated, so
/// probing starts at `max(start, start_offset)`.
#[derive(Clone)]
pub(crate) struct PollEngine {
    storage: LogStorage,
    batch_size: usize,
    start_offset: Offset,
}

impl PollEngine {
    pub(crate) fn new(storage: LogStorage, batch_size: usize, start_offset: Offset) -> Self {
        Self {
            storage,
            batch_size,
            start_offset,
        }
    }

    /// Polls every requested key concurrently.
    ///
    /// Every requested key appears in the result, with an empty sequence
    /// when it has no entries at or above its start offset.
    pub(crate) async fn poll(
        &self,
        requests: HashMap<String, Offset>,
    ) -> Result<HashMap<String, Vec<LogEntry>>> {
        let polls = requests.into_iter().map(|(log_key, from)| async move {
            let entries = self.poll_key(&log_key, from).await?;
            Ok::<_, Error>((log_key, entries))
        });
        Ok(try_join_all(polls).await?.into_iter().collect())
    }

    /// Returns up to `batch_size` entries of `log_key` with offset >= `from`,
    /// in ascending offset order.
    pub(crate) async fn poll_key(&self, log_key: &str, from: Offset) -> Result<Vec<LogEntry>> {
        let Some(highest) = self
            .storage
            .read_marker(&highest_offset_key(log_key))
            .await?
        else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(self.batch_size);
        let mut skipped = 0u64;
        for offset in from.max(self.start_offset)..=highest {
            match self.storage.read_entry(log_key, offset).await? {
                Some(message) => {
                    entries.push(LogEntry::new(offset, message));
                    if entries.len() >= self.batch_size {
                        break;
                    }
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(log_key, from, highest, skipped, "skipped unwritten offsets");
        }
        Ok(entries)
    }
}
