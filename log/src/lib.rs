//! Commit Log - a Kafka-style replicated log over a key-value substrate.
//!
//! Each log key names an independent, append-only log of integer messages.
//! Clients append messages, poll bounded batches from an offset, and record
//! per-key committed offsets as consumer progress.
//!
//! # Architecture
//!
//! The log keeps no state of its own. Everything lives in a linearizable
//! key-value substrate (see [`common::Storage`]) under a small family of
//! keys per log:
//!
//! - `<key>/highest_offset`: the most recently allocated offset.
//! - `<key>/data/<offset>`: one entry per allocated offset.
//! - `<key>/committed_offset`: the highest committed offset.
//!
//! Offsets are allocated by advancing the highest-offset marker with
//! compare-and-swap. Concurrent writers, in one process or many, never
//! receive the same offset, and a key's offsets form a contiguous sequence.
//! Commits use the same loop with a max-merge, so the committed offset never
//! moves backwards.
//!
//! # Example
//!
//! ```ignore
//! use std::collections::HashMap;
//! use commitlog::{CommitLog, Config};
//!
//! let log = CommitLog::open(Config::default()).await?;
//!
//! let first = log.send("x", 10).await?;  // 1000
//! let second = log.send("x", 20).await?; // 1001
//!
//! let msgs = log.poll(HashMap::from([("x".to_string(), first)])).await?;
//! for entry in &msgs["x"] {
//!     println!("offset={} msg={}", entry.offset, entry.message);
//! }
//!
//! log.commit_offsets(HashMap::from([("x".to_string(), second)])).await?;
//! ```

mod allocator;
mod cas;
mod commit;
mod config;
mod error;
mod log;
mod model;
mod reader;
mod serde;
#[cfg(feature = "http-server")]
pub mod server;
mod storage;
mod writer;

pub use config::{Config, DEFAULT_POLL_BATCH_SIZE, DEFAULT_START_OFFSET, RetryConfig, WriteOptions};
pub use error::{Error, Result};
pub use log::CommitLog;
pub use model::{LogEntry, Message, Offset};
