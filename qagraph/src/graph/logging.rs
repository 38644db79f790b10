//! Logging helpers for graph execution.
//!
//! Structured `tracing` events for run start/complete/error and per-node
//! progress. Node events are emitted at debug level.

use crate::error::AgentError;

/// Log node execution start; `parallel` marks fan-out groups.
pub fn log_node_start(node_id: &str, parallel: bool) {
    tracing::debug!(node_id, parallel, "Starting node execution");
}

/// Log node execution completion and the node chosen next.
pub fn log_node_complete(node_id: &str, next: &str) {
    tracing::debug!(node_id, next, "Node execution complete");
}

/// Log state update after merging a node's output.
pub fn log_state_update(node_id: &str, keys: usize) {
    tracing::debug!(node_id, keys, "State updated");
}

pub fn log_graph_start(run_id: Option<&str>) {
    tracing::info!(run_id, "Starting graph execution");
}

pub fn log_graph_complete(run_id: Option<&str>, steps: usize) {
    tracing::info!(run_id, steps, "Graph execution complete");
}

pub fn log_graph_error(run_id: Option<&str>, error: &AgentError) {
    tracing::error!(run_id, %error, "Graph execution error");
}
