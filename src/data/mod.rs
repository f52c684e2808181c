//! Metric schema, per-server history and value derivation.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of interval strings (e.g., "10s", "500ms")
//! - [`metric`]: Metric definitions, field paths and typed values
//! - [`registry`]: The ordered, write-once [`MetricRegistry`]
//! - [`catalog`]: The default HBase region server metrics
//! - [`ring`]: Fixed-capacity newest-first [`RingBuffer`]
//! - [`store`]: Per-server [`SnapshotStore`] with liveness
//! - [`server`]: The monitored [`RegionServer`]
//! - [`engine`]: [`MetricEngine`], the name-based lookup used by the renderer
//!
//! ## Data Flow
//!
//! ```text
//! fetch outcome (JSON or FetchError)
//!        │
//!        ▼
//! RegionServer::record() ──▶ SnapshotStore::push()
//!                                   │
//!                                   ▼
//! MetricEngine::get(server, name) ──▶ SnapshotStore::value_for(definition)
//!                                   │
//!                                   ▼
//!                   "DEAD" | "WAITING" | "N/A" | value
//! ```

pub mod catalog;
pub mod duration;
pub mod engine;
pub mod metric;
pub mod registry;
pub mod ring;
pub mod server;
pub mod store;

pub use catalog::hbase_registry;
pub use engine::{EngineError, MetricEngine};
pub use metric::{ExtractError, FieldPath, MetricDefinition, MetricValue, Window};
pub use registry::{MetricRegistry, RegistryError};
pub use ring::RingBuffer;
pub use server::RegionServer;
pub use store::{SnapshotStore, DEAD, UNAVAILABLE, WAITING};
