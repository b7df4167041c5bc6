//! Committed-offset tracking.

use std::collections::HashMap;

use futures::future::try_join_all;

use crate::cas::{MarkerUpdate, update_marker};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::model::Offset;
use crate::serde::committed_offset_key;
use crate::storage::LogStorage;

/// Advances and reports per-key committed offsets.
///
/// The committed offset of a key only ever grows: a commit installs
/// `max(current, offset)` through the same compare-and-swap loop the
/// allocator uses, so concurrent commits in any order converge on the
/// largest offset ever committed. Commits are not validated against the
/// log's highest offset.
#[derive(Clone)]
pub(crate) struct CommitTracker {
    storage: LogStorage,
    retry: RetryConfig,
}

impl CommitTracker {
    pub(crate) fn new(storage: LogStorage, retry: RetryConfig) -> Self {
        Self { storage, retry }
    }

    /// Raises the committed offset of `log_key` to at least `offset`.
    ///
    /// Returns the committed offset after the call.
    pub(crate) async fn commit(&self, log_key: &str, offset: Offset) -> Result<Offset> {
        let marker = committed_offset_key(log_key);
        let update = update_marker(&self.storage, &marker, &self.retry, |current| {
            match current {
                Some(current) if current >= offset => None,
                _ => Some(offset),
            }
        })
        .await?;
        match update {
            MarkerUpdate::Swapped(committed) => Ok(committed),
            MarkerUpdate::Unchanged(Some(committed)) => Ok(committed),
            MarkerUpdate::Unchanged(None) => Err(Error::Internal(format!(
                "commit of {} to log {} left no marker",
                offset, log_key
            ))),
        }
    }

    /// Commits every `(log_key, offset)` pair concurrently.
    pub(crate) async fn commit_all(&self, offsets: HashMap<String, Offset>) -> Result<()> {
        let commits = offsets
            .iter()
            .map(|(log_key, offset)| self.commit(log_key, *offset));
        try_join_all(commits).await?;
        Ok(())
    }

    /// Reads the committed offsets of `log_keys`.
    ///
    /// Keys that were never committed are omitted from the result.
    pub(crate) async fn list_committed(
        &self,
        log_keys: &[String],
    ) -> Result<HashMap<String, Offset>> {
        let reads = log_keys.iter().map(|log_key| async move {
            let committed = self
                .storage
                .read_marker(&committed_offset_key(log_key))
                .await?;
            Ok::<_, Error>(committed.map(|offset| (log_key.clone(), offset)))
        });
        Ok(try_join_all(reads).await?.into_iter().flatten().collect())
    }
}
