use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::Task;
use crate::llm::LlmClient;
use crate::pipeline::prompts;
use crate::retry::RetryPolicy;
use crate::state::{update, SharedState, StateUpdate};

use super::complete_or_placeholder;

const INSUFFICIENT_PHRASES: [&str; 5] = [
    prompts::NEED_MORE_CONTEXT,
    "needs more context",
    "more context is needed",
    "insufficient context",
    "not enough context",
];

/// True when the verdict asks for more context. Placeholder verdicts never do.
pub fn needs_more_context(verdict: &str) -> bool {
    if verdict.starts_with("[Error:") {
        return false;
    }
    let lower = verdict.to_lowercase();
    INSUFFICIENT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Judges whether `final` answers `query`. Writes `verdict` and `needs_more_context`.
pub struct ValidateNode {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl ValidateNode {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }
}

#[async_trait]
impl Task for ValidateNode {
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        let query = state.require_str("query")?;
        let summary = state.get_str("final").unwrap_or_default();
        let verdict = complete_or_placeholder(
            &*self.llm,
            &self.retry,
            "validate",
            prompts::validate(query, summary),
        )
        .await;
        let needs = needs_more_context(&verdict);
        if needs {
            tracing::info!("validator indicates context is insufficient");
        }
        Ok(update([
            ("verdict", json!(verdict)),
            ("needs_more_context", json!(needs)),
        ]))
    }
}
