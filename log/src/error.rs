//! Error types for commit log operations.
//!
//! This module defines [`Error`], the error type for every log operation,
//! along with a convenient [`Result`] type alias.

use common::StorageError;

/// Error type for commit log operations.
///
/// # Error Categories
///
/// - [`Storage`](Error::Storage): The substrate failed or is unavailable.
///   Never retried by the log; surfaced to the caller as a failed request.
/// - [`Encoding`](Error::Encoding): A value read from the substrate could
///   not be decoded as an offset or message.
/// - [`InvalidInput`](Error::InvalidInput): The caller supplied invalid
///   parameters or configuration.
/// - [`Contention`](Error::Contention): A compare-and-swap loop kept losing
///   races until its deadline expired.
/// - [`Internal`](Error::Internal): An invariant inside the log or the
///   substrate was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Substrate errors such as I/O failures or a closed database.
    Storage(String),

    /// Substrate values that do not decode as offsets or messages.
    Encoding(String),

    /// Invalid arguments or configuration.
    InvalidInput(String),

    /// Compare-and-swap retries exhausted their deadline.
    ///
    /// The operation had no visible effect; retrying later is safe.
    Contention(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Contention(msg) => write!(f, "Contention: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Storage(msg) => Error::Storage(msg),
            StorageError::NotFound(_) => Error::Storage(err.to_string()),
            StorageError::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Result type alias for commit log operations.
pub type Result<T> = std::result::Result<T, Error>;
