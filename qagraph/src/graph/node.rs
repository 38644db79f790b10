//! Stage node: a task under a name, either simple or a parallel group.
//!
//! The variant is fixed when the node is registered, so the executor dispatches
//! on a tag instead of inspecting the node at run time.

use std::sync::Arc;

use crate::error::AgentError;
use crate::state::{SharedState, StateUpdate};

use super::{ParallelGroup, RunContext, Task};

/// Registered node: what the executor runs when traversal reaches its name.
#[derive(Clone)]
pub enum NodeKind {
    /// Runs the task once with the whole current state.
    Simple(Arc<dyn Task>),
    /// Fans out over a list in state and collects branch outputs.
    Parallel(ParallelGroup),
}

impl NodeKind {
    /// Runs the node and returns the update to merge into the shared state.
    pub(crate) async fn execute(
        &self,
        node_id: &str,
        state: &SharedState,
        ctx: &RunContext,
    ) -> Result<StateUpdate, AgentError> {
        match self {
            NodeKind::Simple(task) => task.run_with_context(state, ctx).await,
            NodeKind::Parallel(group) => group.run(node_id, state, ctx).await,
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, NodeKind::Parallel(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::task_fn;
    use crate::state::update;
    use serde_json::json;

    /// **Scenario**: the tag tells a fan-out group from a simple stage.
    #[test]
    fn is_parallel_follows_variant() {
        let task: Arc<dyn Task> = Arc::new(task_fn(|_s| async move {
            Ok(update([("response", json!(1))]))
        }));
        assert!(!NodeKind::Simple(task.clone()).is_parallel());
        assert!(NodeKind::Parallel(ParallelGroup::new("items", task, "out")).is_parallel());
    }
}
