//! JSON message bodies for the log server.
//!
//! Field names and `type` tags form the wire contract shared with clients
//! and must not change.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{LogEntry, Message, Offset};

/// Body of a `send` request: append `msg` to the log named `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub key: String,
    pub msg: Message,
}

/// Body of a `poll` request: start offset per log key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRequest {
    pub offsets: HashMap<String, Offset>,
}

/// Body of a `commit_offsets` request: offset to commit per log key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOffsetsRequest {
    pub offsets: HashMap<String, Offset>,
}

/// Body of a `list_committed_offsets` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCommittedOffsetsRequest {
    pub keys: Vec<String>,
}

/// Any request, discriminated by its `type` field.
///
/// Unknown extra fields (such as message ids added by a transport) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Send(SendRequest),
    Poll(PollRequest),
    CommitOffsets(CommitOffsetsRequest),
    ListCommittedOffsets(ListCommittedOffsetsRequest),
}

/// Any reply, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    SendOk {
        offset: Offset,
    },
    PollOk {
        msgs: HashMap<String, Vec<(Offset, Message)>>,
    },
    CommitOffsetsOk {},
    ListCommittedOffsetsOk {
        offsets: HashMap<String, Offset>,
    },
    Error {
        code: u32,
        text: String,
    },
}

impl Response {
    /// Builds a `poll_ok` reply from poll results.
    pub fn poll_ok(msgs: HashMap<String, Vec<LogEntry>>) -> Self {
        let msgs = msgs
            .into_iter()
            .map(|(key, entries)| (key, entries.into_iter().map(Into::into).collect()))
            .collect();
        Response::PollOk { msgs }
    }
}
