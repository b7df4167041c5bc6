//! Per-key offset allocation.

use crate::cas::{MarkerUpdate, update_marker};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::model::Offset;
use crate::serde::highest_offset_key;
use crate::storage::LogStorage;

/// Reserves strictly increasing, gap-free offsets per log key.
///
/// The highest allocated offset of each key lives in the substrate under
/// `<logKey>/highest_offset`. Allocation advances it by one with a
/// compare-and-swap, so two allocators can never claim the same offset even
/// when they run in different processes. The first allocation for a key
/// yields `start_offset`.
#[derive(Clone)]
pub(crate) struct OffsetAllocator {
    storage: LogStorage,
    retry: RetryConfig,
    start_offset: Offset,
}

impl OffsetAllocator {
    pub(crate) fn new(storage: LogStorage, retry: RetryConfig, start_offset: Offset) -> Self {
        Self {
            storage,
            retry,
            start_offset,
        }
    }

    /// Allocates the next offset for `log_key`.
    pub(crate) async fn allocate(&self, log_key: &str) -> Result<Offset> {
        let marker = highest_offset_key(log_key);
        let start = self.start_offset;
        let update = update_marker(&self.storage, &marker, &self.retry, |highest| {
            Some(match highest {
                Some(highest) => highest.checked_add(1)?,
                None => start,
            })
        })
        .await?;
        match update {
            MarkerUpdate::Swapped(offset) => Ok(offset),
            MarkerUpdate::Unchanged(_) => Err(Error::Internal(format!(
                "offset space exhausted for log {}",
                log_key
            ))),
        }
    }

    /// Returns the highest offset allocated so far for `log_key`.
    pub(crate) async fn highest(&self, log_key: &str) -> Result<Option<Offset>> {
        self.storage.read_marker(&highest_offset_key(log_key)).await
    }
}
