//! Streaming types for graph runs.
//!
//! Defines stream modes and events for value, update and custom streaming.
//! Used by `CompiledStateGraph::stream`, by tasks that emit progress through
//! `RunContext::emit_custom`, and by the server's SSE endpoint.

use serde::Serialize;
use serde_json::Value;

use crate::state::{SharedState, StateUpdate};

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each stage completes.
    Values,
    /// Emit the partial update a stage returned, with its node id.
    Updates,
    /// Emit custom JSON payloads from tasks.
    Custom,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Full state snapshot after a stage finishes.
    Values(SharedState),
    /// Update returned by one stage (for a parallel node: the collected output).
    Updates { node_id: String, update: StateUpdate },
    /// Custom JSON payload for arbitrary streaming data.
    Custom(Value),
    /// The run failed; no further events follow. Only sent by `stream()`.
    Error(String),
}

impl StreamEvent {
    /// Event name used as the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Values(_) => "values",
            StreamEvent::Updates { .. } => "updates",
            StreamEvent::Custom(_) => "custom",
            StreamEvent::Error(_) => "error",
        }
    }
}
