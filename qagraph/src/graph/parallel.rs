//! Parallel group: fan-out over a list in state, fan-in into one ordered collection.
//!
//! The group runs its inner task once per element of the list at `fanout_key`.
//! Each branch gets a copy of the parent state with the list replaced by the
//! single element (under `item_key`). From each branch's update only
//! `output_field` is kept; the values are collected in input order under
//! `collect_key`.

use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::state::{update, SharedState, StateUpdate};

use super::{RunContext, Task};

/// What a parallel group does when one of its branches fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchFailurePolicy {
    /// The first failing branch fails the whole run; outstanding branches are dropped.
    FailFast,
    /// Failed positions hold `null` in the collection and `{index, error}` records
    /// are written under `failures_key`.
    Isolate { failures_key: String },
}

/// Fan-out/fan-in stage. Register with `StateGraph::add_parallel_node`.
///
/// **Interaction**: Holds an inner `Arc<dyn Task>`; run by the executor when the
/// node is reached, its returned update is merged into the parent state.
#[derive(Clone)]
pub struct ParallelGroup {
    fanout_key: String,
    item_key: String,
    inner: Arc<dyn Task>,
    output_field: String,
    collect_key: String,
    max_concurrency: Option<usize>,
    failure_policy: BranchFailurePolicy,
}

impl ParallelGroup {
    /// Fans out over the list at `fanout_key`, collecting each branch's `"response"`
    /// into `collect_key`. Elements are bound under `"item"` in branch state.
    pub fn new(
        fanout_key: impl Into<String>,
        inner: Arc<dyn Task>,
        collect_key: impl Into<String>,
    ) -> Self {
        Self {
            fanout_key: fanout_key.into(),
            item_key: "item".to_string(),
            inner,
            output_field: "response".to_string(),
            collect_key: collect_key.into(),
            max_concurrency: None,
            failure_policy: BranchFailurePolicy::FailFast,
        }
    }

    /// Key under which each branch sees its element.
    pub fn with_item_key(mut self, key: impl Into<String>) -> Self {
        self.item_key = key.into();
        self
    }

    /// Field read from each branch's update.
    pub fn with_output_field(mut self, field: impl Into<String>) -> Self {
        self.output_field = field.into();
        self
    }

    /// Runs at most `limit` branches at once (minimum 1). Default: all at once.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    /// Switches to [`BranchFailurePolicy::Isolate`], reporting failures under `failures_key`.
    pub fn isolate_failures(mut self, failures_key: impl Into<String>) -> Self {
        self.failure_policy = BranchFailurePolicy::Isolate {
            failures_key: failures_key.into(),
        };
        self
    }

    pub fn fanout_key(&self) -> &str {
        &self.fanout_key
    }

    pub fn collect_key(&self) -> &str {
        &self.collect_key
    }

    pub fn failure_policy(&self) -> &BranchFailurePolicy {
        &self.failure_policy
    }

    /// Runs all branches and returns the update holding the ordered collection.
    pub(crate) async fn run(
        &self,
        node_id: &str,
        state: &SharedState,
        ctx: &RunContext,
    ) -> Result<StateUpdate, AgentError> {
        let items: Vec<Value> = match state.get_list(&self.fanout_key) {
            Some(list) => list.clone(),
            None => {
                tracing::debug!(
                    node_id,
                    fanout_key = %self.fanout_key,
                    "fan-out key missing or not a list; running zero branches"
                );
                Vec::new()
            }
        };
        let count = items.len();
        tracing::debug!(node_id, branches = count, "fan-out");

        let limit = self.max_concurrency.unwrap_or(count).max(1);
        let branches = items.into_iter().enumerate().map(|(index, item)| {
            let mut branch_state = state.clone();
            branch_state.remove(&self.fanout_key);
            branch_state.insert(self.item_key.clone(), item);
            let inner = Arc::clone(&self.inner);
            async move {
                let mut out = inner
                    .run_with_context(&branch_state, ctx)
                    .await
                    .map_err(|e| (index, e.to_string()))?;
                out.remove(&self.output_field).ok_or_else(|| {
                    (
                        index,
                        format!("branch update has no '{}' field", self.output_field),
                    )
                })
            }
        });
        let results = futures::stream::iter(branches).buffered(limit);

        match &self.failure_policy {
            BranchFailurePolicy::FailFast => {
                let collected: Vec<Value> =
                    results
                        .try_collect()
                        .await
                        .map_err(|(index, message)| AgentError::BranchFailed {
                            node: node_id.to_string(),
                            index,
                            message,
                        })?;
                Ok(update([(self.collect_key.clone(), Value::Array(collected))]))
            }
            BranchFailurePolicy::Isolate { failures_key } => {
                let outcomes: Vec<Result<Value, (usize, String)>> = results.collect().await;
                let mut collected = Vec::with_capacity(count);
                let mut failures = Vec::new();
                for outcome in outcomes {
                    match outcome {
                        Ok(v) => collected.push(v),
                        Err((index, message)) => {
                            tracing::warn!(node_id, index, error = %message, "branch failed");
                            collected.push(Value::Null);
                            failures.push(json!({ "index": index, "error": message }));
                        }
                    }
                }
                Ok(update([
                    (self.collect_key.clone(), Value::Array(collected)),
                    (failures_key.clone(), Value::Array(failures)),
                ]))
            }
        }
    }
}
