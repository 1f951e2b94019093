//! Latest-value table: written by the fetcher, read by the renderers.

use std::collections::HashMap;
use std::time::Instant;

// ── Values ──────────────────────────────────────────────────────────

/// A single fetched reading.
///
/// Three scalar shapes cover every source: booleans from health probes,
/// numbers from gauges and counters, and short status words from the coarse
/// overview endpoint. Absence of a key is meaningful (renders as Unknown)
/// and is therefore not represented as a variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Truthiness, as health and boolean metrics read it.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric view for gauge comparisons. Booleans count as 0/1; status
    /// words have no numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Convert a scalar JSON value. Nulls, arrays, and objects have no
    /// pixel representation and are skipped by the merge.
    pub fn from_json(raw: &serde_json::Value) -> Option<Value> {
        match raw {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// The single mutable table of latest fetched values.
///
/// One writer (the fetcher) and one reader (the active renderer), both
/// driven from the scheduler's thread, so no synchronization is needed.
/// Keys are overwritten in place on each fetch cycle and never cleared:
/// a failed fetch leaves stale-but-present values on display until the
/// next successful one.
#[derive(Debug, Default)]
pub struct StatusStore {
    data: HashMap<String, Value>,
    last_update: Option<Instant>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Primary lookup with a fallback key. The grid renderer reads
    /// `<source>_health` falling back to the literal metric name, and the
    /// payload key falling back the same way for every other kind.
    pub fn get_or(&self, primary: &str, fallback: &str) -> Option<&Value> {
        self.data.get(primary).or_else(|| self.data.get(fallback))
    }

    /// Stamp the store after a fetch cycle completes.
    pub fn mark_updated(&mut self) {
        self.last_update = Some(Instant::now());
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
