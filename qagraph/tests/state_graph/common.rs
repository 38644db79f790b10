//! Shared task builders for state graph integration tests.

use std::sync::Arc;

use qagraph::graph::{task_fn, Task};
use qagraph::state::{update, SharedState};
use serde_json::{json, Value};

/// Task that appends `name` to the list under `"trace"`.
pub fn append(name: &'static str) -> Arc<dyn Task> {
    Arc::new(task_fn(move |s: SharedState| async move {
        let mut trace = s.get_list("trace").cloned().unwrap_or_default();
        trace.push(json!(name));
        Ok(update([("trace", Value::Array(trace))]))
    }))
}

/// Task that writes `value` under `key`.
pub fn write(key: &'static str, value: &'static str) -> Arc<dyn Task> {
    Arc::new(task_fn(move |_s: SharedState| async move {
        Ok(update([(key, json!(value))]))
    }))
}

pub fn state(v: Value) -> SharedState {
    SharedState::try_from(v).expect("object state")
}
