//! Run-time error types.
//!
//! Returned by `Task::run`, by `CompiledStateGraph::invoke` and by the pipeline
//! agents. Graph structure problems are reported earlier, at compile time, by
//! [`CompilationError`](crate::graph::CompilationError).

use std::time::Duration;

use thiserror::Error;

/// Error raised while executing a compiled graph.
///
/// Task functions report their own failures through `ExecutionFailed`; the
/// remaining variants are produced by the executor itself.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, bad state shape).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A parallel group branch failed while the group runs fail-fast.
    #[error("branch {index} of parallel node '{node}' failed: {message}")]
    BranchFailed {
        node: String,
        index: usize,
        message: String,
    },

    /// A conditional edge router returned a target it did not declare.
    #[error("node '{node}' routed to undeclared target '{target}'")]
    InvalidRoute { node: String, target: String },

    /// The run executed more stages than the configured recursion limit allows.
    #[error("recursion limit of {0} stages reached without hitting END")]
    RecursionLimit(usize),

    /// The run did not finish before its deadline; outstanding work was dropped.
    #[error("run timed out after {0:?}")]
    Timeout(Duration),
}
