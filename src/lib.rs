//! # regionwatch
//!
//! A live terminal dashboard for HBase region servers.
//!
//! Every poll period the dashboard fetches `/metrics?format=json` from each
//! region server's info port, keeps a short newest-first history of the raw
//! documents per server, derives display values from that history and
//! repaints a full-screen table with one row per server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  app::PollLoop                                               │
//! │    │ fetch (concurrent)        │ rows                        │
//! │    ▼                           ▼                             │
//! │  source ──▶ data::RegionServer ──▶ data::MetricEngine ──▶ ui │
//! │  (HTTP)     (SnapshotStore)        (MetricRegistry)   (table)│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: metric definitions, the ordered [`MetricRegistry`], the
//!   per-server [`SnapshotStore`] and the [`MetricEngine`] lookup
//! - **[`source`]**: the [`MetricsFetcher`] trait, its HTTP implementation
//!   and server list parsing
//! - **[`ui`]**: the [`TabularRenderer`] and terminal lifecycle
//! - **[`app`]**: the [`PollLoop`] tying fetch, history and paint together
//! - **[`config`]**: layered startup settings
//! - **[`events`]**: keyboard commands
//!
//! Cells show the metric value, or one of three sentinels: `DEAD` when the
//! last poll of the server failed, `WAITING` while a metric still lacks the
//! history it needs, and `N/A` when a successful poll lacks the field.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Servers from $HBASE_HOME/conf/regionservers, port from the master
//! regionwatch --master hmaster.example.com
//!
//! # Explicit server list and port, polling every 5 seconds
//! regionwatch --servers ./regionservers --port 60030 --interval 5s
//! ```
//!
//! ### Deriving values from polls
//!
//! ```
//! use std::sync::Arc;
//! use regionwatch::{MetricEngine, MetricRegistry, RegionServer};
//! use serde_json::json;
//!
//! let mut registry = MetricRegistry::new();
//! registry.register_gauge("REQS", "requests").unwrap();
//! registry.register_delta("OPS", "ops").unwrap();
//! let engine = MetricEngine::new(Arc::new(registry));
//!
//! let mut server = RegionServer::new("rs1", 60030, engine.registry());
//! server.record(Ok(json!({"requests": 100, "ops": 10})));
//! assert_eq!(engine.get(&server, "OPS").unwrap(), "WAITING");
//!
//! server.record(Ok(json!({"requests": 150, "ops": 25})));
//! assert_eq!(engine.get(&server, "REQS").unwrap(), "150");
//! assert_eq!(engine.get(&server, "OPS").unwrap(), "15");
//! ```
//!
//! ### Fetching one server
//!
//! ```no_run
//! use std::time::Duration;
//! use regionwatch::{HttpFetcher, MetricsFetcher};
//!
//! # tokio_test::block_on(async {
//! let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
//! let document = fetcher.fetch("rs1.example.com:60030").await.unwrap();
//! println!("{}", document["hbase"]);
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{PollLoop, ServerRow};
pub use config::{ConfigError, RawSettings, Settings};
pub use data::{
    hbase_registry, EngineError, ExtractError, FieldPath, MetricDefinition, MetricEngine,
    MetricRegistry, MetricValue, RegionServer, RegistryError, RingBuffer, SnapshotStore, DEAD,
    UNAVAILABLE, WAITING,
};
pub use events::Command;
pub use source::{FetchError, HttpFetcher, MetricsFetcher, Snapshot};
pub use ui::{RenderError, TableRow, TabularRenderer, Theme};
