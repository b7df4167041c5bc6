//! Core data types for the commit log.

/// Position of an entry within a single log.
///
/// Offsets for a given log key are strictly increasing and contiguous,
/// starting at the configured start offset. Offsets of different keys are
/// unrelated.
pub type Offset = u64;

/// Payload carried by a log entry.
pub type Message = i64;

/// An entry read from a log.
///
/// Entries are returned by [`CommitLog::poll`](crate::CommitLog::poll) in
/// ascending offset order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    /// The offset allocated to this entry at append time.
    pub offset: Offset,
    /// The appended message.
    pub message: Message,
}

impl LogEntry {
    pub fn new(offset: Offset, message: Message) -> Self {
        Self { offset, message }
    }
}

impl From<LogEntry> for (Offset, Message) {
    fn from(entry: LogEntry) -> Self {
        (entry.offset, entry.message)
    }
}
