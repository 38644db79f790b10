//! Node middleware: wraps every stage execution in a compiled graph.
//!
//! Set with `StateGraph::with_middleware`; the executor calls `around_run` with a
//! closure that performs the actual stage (simple task or parallel group).

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::{SharedState, StateUpdate};

/// Boxed future returned by the inner stage closure.
pub type NodeFuture = Pin<Box<dyn Future<Output = Result<StateUpdate, AgentError>> + Send>>;

/// Inner stage closure passed to [`NodeMiddleware::around_run`].
pub type NodeRun = Box<dyn FnOnce(SharedState) -> NodeFuture + Send>;

#[async_trait]
pub trait NodeMiddleware: Send + Sync {
    /// Runs `inner(state)`; may inspect or replace the state before and the update after.
    async fn around_run(
        &self,
        node_id: &str,
        state: SharedState,
        inner: NodeRun,
    ) -> Result<StateUpdate, AgentError>;
}

/// Middleware that logs node enter/exit with elapsed time and the keys written.
pub struct LoggingNodeMiddleware;

#[async_trait]
impl NodeMiddleware for LoggingNodeMiddleware {
    async fn around_run(
        &self,
        node_id: &str,
        state: SharedState,
        inner: NodeRun,
    ) -> Result<StateUpdate, AgentError> {
        tracing::debug!(node = node_id, "enter");
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(update) => {
                let keys: Vec<&str> = update.keys().map(String::as_str).collect();
                tracing::debug!(node = node_id, elapsed_ms, ?keys, "exit");
            }
            Err(e) => tracing::warn!(node = node_id, elapsed_ms, error = %e, "exit with error"),
        }
        result
    }
}
