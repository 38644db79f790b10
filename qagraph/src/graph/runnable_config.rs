//! Invoke config: run id, recursion limit, deadline.
//!
//! Passed to `CompiledStateGraph::invoke` and visible to tasks through
//! [`RunContext`](super::RunContext).

use std::time::Duration;

/// Default number of stage executions allowed in one run.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Config for a single invoke.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)` and
/// `stream`; the pipeline fills `run_id` with the session id.
#[derive(Debug, Clone)]
pub struct RunnableConfig {
    /// Identifier of this run (the session id for pipeline runs). Used for logging.
    pub run_id: Option<String>,
    /// Maximum number of stage executions before the run fails with `RecursionLimit`.
    pub recursion_limit: usize,
    /// When set, the whole run is aborted with `Timeout` after this long.
    pub deadline: Option<Duration>,
}

impl Default for RunnableConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            deadline: None,
        }
    }
}

impl RunnableConfig {
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
