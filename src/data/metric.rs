//! Metric definitions: what to extract from a window of snapshots and how to
//! display it.
//!
//! A metric has no separate "kind". Gauges read the newest snapshot and
//! declare a required depth of 1; deltas subtract the previous snapshot
//! from the newest and declare a required depth of 2. Anything else can be
//! expressed with [`MetricDefinition::new`] and a custom extraction closure.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::source::Snapshot;

/// Why a metric could not be computed from an otherwise successful poll.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("no value at `{0}`")]
    MissingPath(String),

    #[error("value at `{0}` is not a scalar")]
    NotScalar(String),

    #[error("value `{0}` is not numeric")]
    NotNumeric(String),

    #[error("window holds {available} snapshots, {needed} needed")]
    ShortWindow { needed: usize, available: usize },
}

/// Error returned when a field path string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field path `{0}`")]
pub struct InvalidPath(pub String);

/// A scalar read out of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// Convert a JSON leaf. Objects, arrays and nulls are rejected.
    pub fn from_json(value: &Value, path: &FieldPath) -> Result<Self, ExtractError> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(MetricValue::Int(i)),
                None => n
                    .as_f64()
                    .map(MetricValue::Float)
                    .ok_or_else(|| ExtractError::NotNumeric(n.to_string())),
            },
            Value::String(s) => Ok(MetricValue::Text(s.clone())),
            Value::Bool(b) => Ok(MetricValue::Text(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                Err(ExtractError::NotScalar(path.to_string()))
            }
        }
    }

    /// `self - earlier`. Integers stay integers; any float makes the result
    /// a float. Text cannot be subtracted.
    pub fn checked_sub(&self, earlier: &MetricValue) -> Result<MetricValue, ExtractError> {
        match (self, earlier) {
            (MetricValue::Int(a), MetricValue::Int(b)) => Ok(a
                .checked_sub(*b)
                .map(MetricValue::Int)
                .unwrap_or(MetricValue::Float(*a as f64 - *b as f64))),
            (MetricValue::Text(t), _) | (_, MetricValue::Text(t)) => {
                Err(ExtractError::NotNumeric(t.clone()))
            }
            (a, b) => Ok(MetricValue::Float(a.as_f64()? - b.as_f64()?)),
        }
    }

    pub fn as_f64(&self) -> Result<f64, ExtractError> {
        match self {
            MetricValue::Int(i) => Ok(*i as f64),
            MetricValue::Float(f) => Ok(*f),
            MetricValue::Text(t) => Err(ExtractError::NotNumeric(t.clone())),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(i) => write!(f, "{}", i),
            MetricValue::Float(x) => write!(f, "{}", x),
            MetricValue::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A dotted path into a JSON document, e.g. `hbase.regionserver.0.1.requests`.
///
/// All-digit segments index into arrays. If the node at that point is an
/// object instead, the segment is looked up as a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Walk the path. Returns `None` as soon as a segment does not match.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |node, segment| match segment {
            Segment::Key(key) => node.get(key.as_str()),
            Segment::Index(i) => match node {
                Value::Array(items) => items.get(*i),
                Value::Object(map) => map.get(&i.to_string()),
                _ => None,
            },
        })
    }

    /// Resolve and convert to a [`MetricValue`].
    pub fn extract(&self, root: &Value) -> Result<MetricValue, ExtractError> {
        let leaf = self
            .resolve(root)
            .ok_or_else(|| ExtractError::MissingPath(self.to_string()))?;
        MetricValue::from_json(leaf, self)
    }
}

impl FromStr for FieldPath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    Err(InvalidPath(s.to_string()))
                } else if let Ok(i) = part.parse::<usize>() {
                    Ok(Segment::Index(i))
                } else {
                    Ok(Segment::Key(part.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Key(k) => f.write_str(k)?,
                Segment::Index(n) => write!(f, "{}", n)?,
            }
        }
        Ok(())
    }
}

/// The newest-first slice of history handed to an extraction function.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    snapshots: Vec<&'a Snapshot>,
}

impl<'a> Window<'a> {
    pub fn new(snapshots: Vec<&'a Snapshot>) -> Self {
        Self { snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot `index` polls ago (0 = newest).
    pub fn get(&self, index: usize) -> Result<&'a Snapshot, ExtractError> {
        self.snapshots
            .get(index)
            .copied()
            .ok_or(ExtractError::ShortWindow {
                needed: index + 1,
                available: self.snapshots.len(),
            })
    }
}

pub type ExtractFn = dyn Fn(&Window<'_>) -> Result<MetricValue, ExtractError> + Send + Sync;
pub type FormatFn = dyn Fn(&MetricValue) -> String + Send + Sync;

/// A named metric: extraction, history requirement and optional formatter.
#[derive(Clone)]
pub struct MetricDefinition {
    name: String,
    required_depth: usize,
    extract: Arc<ExtractFn>,
    formatter: Option<Arc<FormatFn>>,
}

impl MetricDefinition {
    pub fn new<F>(name: impl Into<String>, required_depth: usize, extract: F) -> Self
    where
        F: Fn(&Window<'_>) -> Result<MetricValue, ExtractError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            required_depth,
            extract: Arc::new(extract),
            formatter: None,
        }
    }

    /// Value at `path` in the newest snapshot.
    pub fn gauge(name: impl Into<String>, path: FieldPath) -> Self {
        Self::new(name, 1, move |window| path.extract(&window.get(0)?.value))
    }

    /// Newest value at `path` minus the previous poll's value.
    pub fn delta(name: impl Into<String>, path: FieldPath) -> Self {
        Self::new(name, 2, move |window| {
            let current = path.extract(&window.get(0)?.value)?;
            let previous = path.extract(&window.get(1)?.value)?;
            current.checked_sub(&previous)
        })
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&MetricValue) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_depth(&self) -> usize {
        self.required_depth
    }

    /// Run the extraction and formatting over `window`.
    pub fn evaluate(&self, window: &Window<'_>) -> Result<String, ExtractError> {
        let value = (self.extract)(window)?;
        Ok(match &self.formatter {
            Some(format) => format(&value),
            None => value.to_string(),
        })
    }
}

impl fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("name", &self.name)
            .field("required_depth", &self.required_depth)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

/// Render numbers without their fractional part, the way the request rate
/// is shown.
pub fn integer(value: &MetricValue) -> String {
    match value {
        MetricValue::Float(f) if f.is_finite() => format!("{}", f.trunc() as i64),
        other => other.to_string(),
    }
}
