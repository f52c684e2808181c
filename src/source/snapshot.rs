//! Raw poll results as returned by a region server.
//!
//! The metrics servlet answers `/metrics?format=json` with a nested document
//! of contexts, records and tag/metric pairs. Its shape varies between HBase
//! versions, so it is kept as an untyped JSON tree and only interpreted by
//! the field paths of registered metrics.

use serde_json::Value;

/// One successful poll of one region server. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Poll ordinal within the owning store, starting at 1.
    pub ordinal: u64,
    /// The document exactly as the server returned it.
    pub value: Value,
}

impl Snapshot {
    pub fn new(ordinal: u64, value: Value) -> Self {
        Self { ordinal, value }
    }
}
