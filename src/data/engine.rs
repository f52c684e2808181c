//! Read-only lookup of display values by metric name.

use std::sync::Arc;

use thiserror::Error;

use super::registry::MetricRegistry;
use super::server::RegionServer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),
}

/// Answers "what does metric X show for server Y right now".
#[derive(Debug, Clone)]
pub struct MetricEngine {
    registry: Arc<MetricRegistry>,
}

impl MetricEngine {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn get(&self, server: &RegionServer, metric: &str) -> Result<String, EngineError> {
        let definition = self
            .registry
            .definition(metric)
            .ok_or_else(|| EngineError::UnknownMetric(metric.to_string()))?;
        Ok(server.store().value_for(definition))
    }
}
