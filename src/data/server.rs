//! A monitored region server.

use serde_json::Value;
use tracing::{info, warn};

use super::registry::MetricRegistry;
use super::store::SnapshotStore;
use crate::source::FetchError;

/// One region server: its address and its poll history.
///
/// Servers are created once from the server list and live for the whole
/// run. The registry must be complete before construction because its
/// deepest metric sizes the history.
#[derive(Debug, Clone)]
pub struct RegionServer {
    host: String,
    port: u16,
    address: String,
    store: SnapshotStore,
}

impl RegionServer {
    pub fn new(host: impl Into<String>, port: u16, registry: &MetricRegistry) -> Self {
        let host = host.into();
        let address = format!("{}:{}", host, port);
        Self {
            host,
            port,
            address,
            store: SnapshotStore::with_capacity(registry.max_required_depth()),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` of the info server.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_alive(&self) -> bool {
        self.store.is_alive()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Feed one poll outcome into the history, logging liveness changes.
    pub fn record(&mut self, outcome: Result<Value, FetchError>) {
        let was_alive = self.store.is_alive();
        if let Err(ref e) = outcome {
            if was_alive {
                warn!(server = %self.address, error = %e, "region server unreachable");
            }
        }
        self.store.push(outcome);
        if !was_alive && self.store.is_alive() {
            info!(server = %self.address, "region server back online");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capacity_follows_registry() {
        let mut registry = MetricRegistry::new();
        registry.register_gauge("G", "g").unwrap();
        registry.register_delta("D", "d").unwrap();

        let server = RegionServer::new("rs1.example.com", 60030, &registry);
        assert_eq!(server.address(), "rs1.example.com:60030");
        assert_eq!(server.host(), "rs1.example.com");
        assert_eq!(server.port(), 60030);
        assert_eq!(server.store().capacity(), 2);
        assert!(server.is_alive());
    }

    #[test]
    fn test_record_flips_liveness() {
        let registry = MetricRegistry::new();
        let mut server = RegionServer::new("rs1", 60030, &registry);

        server.record(Err(FetchError::Timeout));
        assert!(!server.is_alive());

        server.record(Ok(json!({})));
        assert!(server.is_alive());
        assert_eq!(server.store().len(), 1);
    }
}
