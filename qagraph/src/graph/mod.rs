//! State graph: nodes, edges, compile and invoke.
//!
//! Build a [`StateGraph`] from simple stages ([`Task`]) and fan-out stages
//! ([`ParallelGroup`]), wire them with plain or conditional edges, `compile`,
//! then `invoke` or `stream` a [`CompiledStateGraph`] with an initial state.

mod compile_error;
mod compiled;
mod edge;
mod logging;
mod node;
mod node_middleware;
mod parallel;
mod run_context;
mod runnable_config;
mod state_graph;
mod task;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use edge::RouteFn;
pub use node::NodeKind;
pub use node_middleware::{LoggingNodeMiddleware, NodeFuture, NodeMiddleware, NodeRun};
pub use parallel::{BranchFailurePolicy, ParallelGroup};
pub use run_context::RunContext;
pub use runnable_config::{RunnableConfig, DEFAULT_RECURSION_LIMIT};
pub use state_graph::{StateGraph, END, START};
pub use task::{task_fn, FnTask, Task};
