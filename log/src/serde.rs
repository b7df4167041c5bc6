//! Key naming and value encoding for log state in the substrate.
//!
//! A log is not stored as a single object. Each log key owns a family of
//! substrate keys:
//!
//! ```text
//! <logKey>/highest_offset      most recently allocated offset (u64 BE)
//! <logKey>/data/<offset>       message at that offset (i64 BE)
//! <logKey>/committed_offset    highest committed offset (u64 BE)
//! ```
//!
//! Marker keys end in a fixed non-numeric suffix and entry keys end in a
//! decimal offset, so keys for different purposes never collide, even when
//! a log key itself contains `/`.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::model::{Message, Offset};

const HIGHEST_OFFSET_SUFFIX: &str = "/highest_offset";
const COMMITTED_OFFSET_SUFFIX: &str = "/committed_offset";
const DATA_SEGMENT: &str = "/data/";

/// Substrate key of the highest-allocated-offset marker for `log_key`.
pub(crate) fn highest_offset_key(log_key: &str) -> Bytes {
    Bytes::from(format!("{}{}", log_key, HIGHEST_OFFSET_SUFFIX))
}

/// Substrate key of the committed-offset marker for `log_key`.
pub(crate) fn committed_offset_key(log_key: &str) -> Bytes {
    Bytes::from(format!("{}{}", log_key, COMMITTED_OFFSET_SUFFIX))
}

/// Substrate key of the entry at `offset` in `log_key`.
pub(crate) fn entry_key(log_key: &str, offset: Offset) -> Bytes {
    Bytes::from(format!("{}{}{}", log_key, DATA_SEGMENT, offset))
}

pub(crate) fn encode_offset(offset: Offset) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_u64(offset);
    buf.freeze()
}

pub(crate) fn decode_offset(value: &[u8]) -> Result<Offset> {
    let mut buf = fixed_width(value, "offset")?;
    Ok(buf.get_u64())
}

pub(crate) fn encode_message(message: Message) -> Bytes {
    let mut buf = BytesMut::with_capacity(8);
    buf.put_i64(message);
    buf.freeze()
}

pub(crate) fn decode_message(value: &[u8]) -> Result<Message> {
    let mut buf = fixed_width(value, "message")?;
    Ok(buf.get_i64())
}

fn fixed_width<'a>(value: &'a [u8], what: &str) -> Result<&'a [u8]> {
    if value.len() != 8 {
        return Err(Error::Encoding(format!(
            "{} value must be 8 bytes, got {}",
            what,
            value.len()
        )));
    }
    Ok(value)
}
