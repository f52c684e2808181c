//! Where poll results come from.
//!
//! This module provides a trait-based abstraction over the metrics fetch so
//! the poll loop can be driven by the HTTP client in production and by
//! in-memory fakes in tests. It also reads the server list.

mod http;
mod servers;
mod snapshot;

pub use http::{conf_property, HttpFetcher, REGIONSERVER_INFO_PORT_KEY};
pub use servers::{load_server_list, parse_server_list};
pub use snapshot::Snapshot;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Why a poll produced no document. Every variant marks the server dead for
/// the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// No complete answer within the fetch timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// A 2xx answer whose body was not JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("HTTP request failed: {0}")]
    Http(String),
}

/// Trait for fetching one metrics document from a server.
///
/// Implementations must be safe to call concurrently for different
/// addresses; the poll loop fans out over all servers each cycle.
#[async_trait]
pub trait MetricsFetcher: Send + Sync + Debug {
    /// Fetch the metrics document of the info server at `address`
    /// (`host:port`).
    async fn fetch(&self, address: &str) -> Result<Value, FetchError>;
}
