//! Optimistic read-compute-swap loop over offset markers.
//!
//! Both the offset allocator and the commit tracker advance a marker the
//! same way: read the current value, compute the next one, and install it
//! with a compare-and-swap. A conflict means another writer got there
//! first, so the whole cycle starts over from a fresh read. Substrate
//! errors are never retried.

use std::time::Duration;

use bytes::Bytes;
use common::CasOutcome;
use rand::Rng;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::model::Offset;
use crate::storage::LogStorage;

/// Result of a successful [`update_marker`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerUpdate {
    /// The marker was swapped to this value.
    Swapped(Offset),
    /// The computation declined to write; the marker holds this value.
    Unchanged(Option<Offset>),
}

/// Exponential backoff with full jitter, bounded by a deadline.
pub(crate) struct Backoff {
    next: Duration,
    max: Duration,
    deadline: Instant,
}

impl Backoff {
    pub(crate) fn new(config: &RetryConfig) -> Self {
        Self {
            next: config.initial_backoff,
            max: config.max_backoff,
            deadline: Instant::now() + config.timeout,
        }
    }

    /// Sleeps before the next attempt.
    ///
    /// Returns `false` without sleeping once the deadline has passed.
    pub(crate) async fn wait(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.deadline {
            return false;
        }
        let upper = self.next.as_micros() as u64;
        let jittered = Duration::from_micros(rand::thread_rng().gen_range(0..=upper));
        let sleep_for = jittered.min(self.deadline - now);
        tokio::time::sleep(sleep_for).await;
        self.next = (self.next * 2).min(self.max);
        true
    }
}

/// Advances `marker` with an optimistic retry loop.
///
/// `compute` receives the marker's current value (`None` if absent) and
/// returns the value to install, or `None` to leave the marker untouched.
pub(crate) async fn update_marker<F>(
    storage: &LogStorage,
    marker: &Bytes,
    retry: &RetryConfig,
    mut compute: F,
) -> Result<MarkerUpdate>
where
    F: FnMut(Option<Offset>) -> Option<Offset>,
{
    let mut backoff = Backoff::new(retry);
    let mut attempt: u32 = 1;
    loop {
        let current = storage.read_marker(marker).await?;
        let Some(next) = compute(current) else {
            return Ok(MarkerUpdate::Unchanged(current));
        };
        match storage.swap_marker(marker, current, next).await? {
            CasOutcome::Swapped => return Ok(MarkerUpdate::Swapped(next)),
            CasOutcome::Conflict => {
                tracing::debug!(
                    marker = %String::from_utf8_lossy(marker),
                    attempt,
                    "compare-and-swap conflict, retrying"
                );
                if !backoff.wait().await {
                    return Err(Error::Contention(format!(
                        "gave up updating {} after {} attempts",
                        String::from_utf8_lossy(marker),
                        attempt
                    )));
                }
                attempt += 1;
            }
        }
    }
}
