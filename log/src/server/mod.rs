//! HTTP server for the commit log.
//!
//! This module exposes the four log operations as JSON endpoints, plus a
//! single `rpc` endpoint that dispatches on the request's `type` field.

mod config;
mod error;
pub mod handlers;
mod http;
pub mod metrics;
mod middleware;
pub mod proto;

pub use config::{CliArgs, LogServerConfig};
pub use error::ApiError;
pub use http::{LogServer, router};
