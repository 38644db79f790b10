use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::{ParallelGroup, Task};
use crate::llm::LlmClient;
use crate::memory::ConversationMemory;
use crate::pipeline::prompts;
use crate::retry::RetryPolicy;
use crate::state::{update, SharedState, StateUpdate};

use super::complete_or_placeholder;

/// Answers one sub-question; runs once per branch of the retrieve group.
///
/// Reads `subquestion` and, when present, `api_context`. Writes
/// `response = "Q: {subquestion}\nA: {answer}"` and records the exchange in
/// conversation memory.
pub struct RetrieveNode {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    memory: Arc<ConversationMemory>,
}

impl RetrieveNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        memory: Arc<ConversationMemory>,
    ) -> Self {
        Self { llm, retry, memory }
    }

    /// Fan-out over `subquestions`, collecting responses under `responses`.
    pub fn into_group(self) -> ParallelGroup {
        ParallelGroup::new("subquestions", Arc::new(self), "responses")
            .with_item_key("subquestion")
    }
}

#[async_trait]
impl Task for RetrieveNode {
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        let subquestion = state.require_str("subquestion")?;
        let history = self.memory.history_text().await;
        let prompt = prompts::retrieve(subquestion, &history, state.non_empty_str("api_context"));
        let answer = complete_or_placeholder(&*self.llm, &self.retry, "retrieve", prompt).await;
        self.memory.add_exchange(subquestion, answer.as_str()).await;
        tracing::info!(subquestion, answer = %answer, "retriever answered");
        Ok(update([(
            "response",
            json!(format!("Q: {}\nA: {}", subquestion, answer)),
        )]))
    }
}
