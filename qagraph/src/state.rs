//! Shared state threaded through every stage of one run.
//!
//! The state is a JSON object: string keys mapping to strings, lists or nested
//! objects. Stages never mutate it directly; they return a [`StateUpdate`] that the
//! executor merges on top (top-level keys overwrite, no deep merge).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AgentError;

/// Partial mapping returned by a task and merged into [`SharedState`].
pub type StateUpdate = Map<String, Value>;

/// Builds a [`StateUpdate`] from `(key, value)` pairs.
///
/// ```
/// use qagraph::state::update;
/// use serde_json::json;
///
/// let u = update([("final", json!("summary")), ("citation", json!("[none]"))]);
/// assert_eq!(u["final"], "summary");
/// ```
pub fn update<I, K>(pairs: I) -> StateUpdate
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Key-value record owned by one run.
///
/// Cloning produces a true copy; parallel branches each receive one so they
/// cannot observe each other's writes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedState(Map<String, Value>);

impl SharedState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value at `key` when it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the value at `key` when it is a list.
    pub fn get_list(&self, key: &str) -> Option<&Vec<Value>> {
        self.0.get(key).and_then(Value::as_array)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Returns the string at `key` or an `ExecutionFailed` naming the missing key.
    pub fn require_str(&self, key: &str) -> Result<&str, AgentError> {
        self.get_str(key).ok_or_else(|| {
            AgentError::ExecutionFailed(format!("state key '{}' missing or not a string", key))
        })
    }

    /// Returns the string at `key` unless it is absent, null or empty.
    pub fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Merges `update` on top of this state. A returned key replaces any
    /// existing value of the same name.
    pub fn merge(&mut self, update: StateUpdate) {
        for (k, v) in update {
            self.0.insert(k, v);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Converts to a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for SharedState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for SharedState {
    type Error = AgentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AgentError::ExecutionFailed(format!(
                "state must be a JSON object, got {}",
                other
            ))),
        }
    }
}
