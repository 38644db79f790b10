//! Graph compilation error.
//!
//! Returned by `StateGraph::add_node`, `add_edge`, `add_conditional_edges` and
//! `compile` when the graph structure is invalid. All of these are reported
//! before any run starts.

use thiserror::Error;

/// Error when building or compiling a state graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// `add_node` was called twice with the same name.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// A node id in an edge or the entry point was not registered via `add_node`.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// START and END cannot be used as node names.
    #[error("reserved node name: {0}")]
    ReservedName(String),

    /// `compile` was called before an entry point was set.
    #[error("graph has no entry point")]
    MissingEntryPoint,

    /// A second, different entry point was set.
    #[error("graph already has entry point '{existing}', cannot also start at '{requested}'")]
    MultipleEntryPoints { existing: String, requested: String },

    /// A node already has an outgoing edge; the executor follows exactly one.
    #[error("node '{0}' already has an outgoing edge")]
    DuplicateEdge(String),

    /// A registered node cannot be reached from the entry point.
    #[error("node '{0}' is unreachable from the entry point")]
    UnreachableNode(String),

    /// A reachable node has no outgoing edge, so traversal could never reach END.
    #[error("node '{0}' has no outgoing edge")]
    DeadEnd(String),
}
