//! Per-server poll history and liveness.

use serde_json::Value;
use tracing::debug;

use super::metric::{MetricDefinition, Window};
use super::ring::RingBuffer;
use crate::source::{FetchError, Snapshot};

/// Cell shown for every metric of an unreachable server.
pub const DEAD: &str = "DEAD";
/// Cell shown while fewer snapshots are held than a metric requires.
pub const WAITING: &str = "WAITING";
/// Cell shown when a successful poll lacks the field a metric reads.
pub const UNAVAILABLE: &str = "N/A";

/// Bounded newest-first history of raw polls for one server.
///
/// Failed polls flip the store to dead but keep the history, so a server
/// that comes back does not have to warm up again.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    history: RingBuffer<Snapshot>,
    alive: bool,
    polls: u64,
}

impl SnapshotStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: RingBuffer::with_capacity(capacity),
            alive: true,
            polls: 0,
        }
    }

    /// Record one poll outcome.
    pub fn push(&mut self, outcome: Result<Value, FetchError>) {
        self.polls += 1;
        match outcome {
            Ok(value) => {
                self.history.push_front(Snapshot::new(self.polls, value));
                self.alive = true;
            }
            Err(_) => self.alive = false,
        }
    }

    /// Display value of `definition` for this server.
    pub fn value_for(&self, definition: &MetricDefinition) -> String {
        if !self.alive {
            return DEAD.to_string();
        }
        let depth = definition.required_depth();
        if self.history.len() < depth {
            return WAITING.to_string();
        }

        let window = Window::new(self.history.iter().take(depth).collect());
        match definition.evaluate(&window) {
            Ok(value) => value,
            Err(e) => {
                debug!(metric = definition.name(), error = %e, "metric unavailable");
                UNAVAILABLE.to_string()
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Stored snapshots, newest first.
    pub fn history(&self) -> impl Iterator<Item = &Snapshot> + '_ {
        self.history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FieldPath, MetricRegistry};
    use serde_json::json;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn refused() -> Result<Value, FetchError> {
        Err(FetchError::Connect("connection refused".to_string()))
    }

    #[test]
    fn test_delta_waits_for_two_snapshots() {
        let ops = MetricDefinition::delta("OPS", path("ops"));
        let mut store = SnapshotStore::with_capacity(2);

        assert_eq!(store.value_for(&ops), WAITING);

        store.push(Ok(json!({"ops": 10})));
        assert_eq!(store.value_for(&ops), WAITING);

        store.push(Ok(json!({"ops": 25})));
        assert_eq!(store.value_for(&ops), "15");

        store.push(Ok(json!({"ops": 26})));
        assert_eq!(store.value_for(&ops), "1");
    }

    #[test]
    fn test_gauge_tracks_newest() {
        let reqs = MetricDefinition::gauge("REQS", path("requests"));
        let mut store = SnapshotStore::with_capacity(1);

        store.push(Ok(json!({"requests": 100})));
        store.push(Ok(json!({"requests": 150})));
        assert_eq!(store.value_for(&reqs), "150");
    }

    #[test]
    fn test_length_bounded_by_capacity() {
        let mut store = SnapshotStore::with_capacity(3);
        for n in 0..20 {
            store.push(Ok(json!({ "n": n })));
            assert!(store.len() <= 3);
        }
        let ordinals: Vec<u64> = store.history().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![20, 19, 18]);
    }

    #[test]
    fn test_failed_push_keeps_history() {
        let mut store = SnapshotStore::with_capacity(2);
        store.push(Ok(json!({"ops": 1})));
        store.push(Ok(json!({"ops": 2})));
        let before: Vec<Snapshot> = store.history().cloned().collect();

        store.push(refused());

        assert!(!store.is_alive());
        assert_eq!(store.history().cloned().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_dead_for_every_metric() {
        let mut registry = MetricRegistry::new();
        registry.register_gauge("G", "g").unwrap();
        registry.register_delta("D", "d").unwrap();

        let mut store = SnapshotStore::with_capacity(registry.max_required_depth());
        store.push(Ok(json!({"g": 1, "d": 1})));
        store.push(Ok(json!({"g": 2, "d": 5})));
        store.push(refused());

        for def in registry.iter() {
            assert_eq!(store.value_for(def), DEAD);
        }
    }

    #[test]
    fn test_dead_before_any_history() {
        let g = MetricDefinition::gauge("G", path("g"));
        let mut store = SnapshotStore::with_capacity(1);
        store.push(refused());
        assert_eq!(store.value_for(&g), DEAD);
    }

    #[test]
    fn test_recovery_without_new_warm_up() {
        let ops = MetricDefinition::delta("OPS", path("ops"));
        let mut store = SnapshotStore::with_capacity(2);
        store.push(Ok(json!({"ops": 10})));
        store.push(Ok(json!({"ops": 25})));
        store.push(refused());
        assert_eq!(store.value_for(&ops), DEAD);

        store.push(Ok(json!({"ops": 40})));
        assert!(store.is_alive());
        assert_eq!(store.value_for(&ops), "15");
    }

    #[test]
    fn test_missing_field_is_unavailable() {
        let reqs = MetricDefinition::gauge("REQS", path("hbase.regionserver.0.1.requests"));
        let mut store = SnapshotStore::with_capacity(1);
        store.push(Ok(json!({"hbase": {}})));

        assert!(store.is_alive());
        assert_eq!(store.value_for(&reqs), UNAVAILABLE);
    }
}
