//! Per-execution result store.

use indexmap::IndexMap;
use serde_json::Value;

/// Mapping from action id to that action's recorded output.
///
/// Allocated fresh for every execution, written only by the workflow
/// executor, append-only while a run is in flight, and discarded once the
/// response is built. Insertion order matches execution order.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    values: IndexMap<String, Value>,
}

impl ResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an action's output under its id.
    pub fn record(&mut self, action_id: impl Into<String>, value: Value) {
        self.values.insert(action_id.into(), value);
    }

    /// Returns the recorded output for an action id, if any.
    pub fn get(&self, action_id: &str) -> Option<&Value> {
        self.values.get(action_id)
    }

    /// True when the action id has a recorded output.
    pub fn contains(&self, action_id: &str) -> bool {
        self.values.contains_key(action_id)
    }

    /// Number of recorded outputs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates recorded entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
