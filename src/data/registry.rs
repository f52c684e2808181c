//! Ordered, write-once collection of metric definitions.

use std::collections::HashMap;

use thiserror::Error;

use super::metric::{FieldPath, InvalidPath, MetricDefinition};

/// Configuration mistakes made while building the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("metric `{0}` is already registered")]
    Duplicate(String),

    #[error("metric `{0}` must require at least one snapshot")]
    ZeroDepth(String),

    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),
}

/// All metrics shown by the dashboard, in column order.
///
/// Built once at startup and then shared read-only (typically behind an
/// `Arc`). The largest `required_depth` fixes the history capacity of every
/// server created afterwards, so registration has to finish first.
#[derive(Debug, Default, Clone)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
    by_name: HashMap<String, usize>,
    max_required_depth: usize,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a metric. Its position becomes its column position.
    pub fn register(&mut self, definition: MetricDefinition) -> Result<(), RegistryError> {
        let name = definition.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        if definition.required_depth() == 0 {
            return Err(RegistryError::ZeroDepth(name));
        }

        self.max_required_depth = self.max_required_depth.max(definition.required_depth());
        self.by_name.insert(name, self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    /// Register a gauge read from `path` in the newest snapshot.
    pub fn register_gauge(&mut self, name: &str, path: &str) -> Result<(), RegistryError> {
        let path: FieldPath = path.parse()?;
        self.register(MetricDefinition::gauge(name, path))
    }

    /// Register a delta between the two newest snapshots at `path`.
    pub fn register_delta(&mut self, name: &str, path: &str) -> Result<(), RegistryError> {
        let path: FieldPath = path.parse()?;
        self.register(MetricDefinition::delta(name, path))
    }

    pub fn definition(&self, name: &str) -> Option<&MetricDefinition> {
        self.by_name.get(name).map(|&i| &self.definitions[i])
    }

    /// Metric names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.definitions.iter().map(|d| d.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> + '_ {
        self.definitions.iter()
    }

    /// History capacity needed to serve every registered metric. At least 1.
    pub fn max_required_depth(&self) -> usize {
        self.max_required_depth.max(1)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
