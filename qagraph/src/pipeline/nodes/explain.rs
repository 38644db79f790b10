use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::Task;
use crate::llm::LlmClient;
use crate::memory::ConversationMemory;
use crate::pipeline::prompts;
use crate::retry::RetryPolicy;
use crate::state::{update, SharedState, StateUpdate};

use super::complete_or_placeholder;

/// Expands `final` for a technical audience. Writes `explanation`.
pub struct ExplainNode {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    memory: Arc<ConversationMemory>,
}

impl ExplainNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        memory: Arc<ConversationMemory>,
    ) -> Self {
        Self { llm, retry, memory }
    }
}

#[async_trait]
impl Task for ExplainNode {
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        let summary = state.get_str("final").unwrap_or_default();
        let history = self.memory.history_text().await;
        let explanation = complete_or_placeholder(
            &*self.llm,
            &self.retry,
            "explain",
            prompts::explain(summary, &history),
        )
        .await;
        Ok(update([("explanation", json!(explanation))]))
    }
}
