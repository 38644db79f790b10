//! Task: the unit of work a stage wraps.
//!
//! A task reads the whole shared state and returns a partial update. Tasks are
//! opaque to the executor: they may call models, fetch context, or touch
//! collaborator state as a side effect.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::{SharedState, StateUpdate};

use super::RunContext;

/// One stage's unit of work: state in, partial update out.
///
/// **Interaction**: Registered via `StateGraph::add_node` (simple stage) or as the
/// inner task of a [`ParallelGroup`](super::ParallelGroup). The executor merges the
/// returned update into the shared state.
#[async_trait]
pub trait Task: Send + Sync {
    /// Runs once against the current state and returns the keys to overwrite.
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError>;

    /// Streaming-aware variant. Default: delegates to `run`.
    ///
    /// Override to emit custom stream events through `ctx`.
    async fn run_with_context(
        &self,
        state: &SharedState,
        _ctx: &RunContext,
    ) -> Result<StateUpdate, AgentError> {
        self.run(state).await
    }
}

/// Adapts an async closure `Fn(SharedState) -> Future<Output = Result<StateUpdate, _>>`
/// into a [`Task`]. Build with [`task_fn`].
pub struct FnTask<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Wraps a closure as a task. The closure receives its own copy of the state.
///
/// ```
/// use std::sync::Arc;
/// use qagraph::graph::{task_fn, Task};
/// use qagraph::state::update;
/// use serde_json::json;
///
/// let task: Arc<dyn Task> = Arc::new(task_fn(|_state| async move {
///     Ok(update([("k", json!("v"))]))
/// }));
/// ```
pub fn task_fn<F, Fut>(f: F) -> FnTask<F, Fut>
where
    F: Fn(SharedState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateUpdate, AgentError>> + Send,
{
    FnTask {
        f,
        _fut: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F, Fut>
where
    F: Fn(SharedState) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateUpdate, AgentError>> + Send,
{
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        (self.f)(state.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::update;
    use serde_json::json;

    /// **Scenario**: a closure task sees the state it was given and its update is returned as-is.
    #[tokio::test]
    async fn fn_task_runs_closure_with_state_copy() {
        let task = task_fn(|state: SharedState| async move {
            let q = state.get_str("query").unwrap_or_default().to_uppercase();
            Ok(update([("upper", json!(q))]))
        });
        let state = SharedState::try_from(json!({"query": "abc"})).unwrap();
        let out = task.run(&state).await.unwrap();
        assert_eq!(out["upper"], "ABC");
    }

    /// **Scenario**: run_with_context defaults to run.
    #[tokio::test]
    async fn run_with_context_defaults_to_run() {
        let task = task_fn(|_s| async move { Ok(update([("x", json!(1))])) });
        let out = task
            .run_with_context(&SharedState::new(), &RunContext::default())
            .await
            .unwrap();
        assert_eq!(out["x"], 1);
    }
}
