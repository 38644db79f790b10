use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::graph::Task;
use crate::llm::LlmClient;
use crate::memory::ConversationMemory;
use crate::pipeline::prompts;
use crate::retry::RetryPolicy;
use crate::state::{update, SharedState, StateUpdate};

use super::complete_or_placeholder;

pub const NO_CITATION: &str = "[No citation available]";
pub const CITATION_MAX_CHARS: usize = 300;

/// Citation text: external context, else the paper URL, else [`NO_CITATION`].
///
/// Text longer than [`CITATION_MAX_CHARS`] characters is cut and suffixed with `"..."`.
/// Text at or under the limit is returned whole, with no `"..."` appended.
pub fn citation_for(state: &SharedState) -> String {
    let source = state
        .non_empty_str("api_context")
        .or_else(|| state.non_empty_str("doc_context"));
    match source {
        None => NO_CITATION.to_string(),
        Some(s) if s.chars().count() > CITATION_MAX_CHARS => {
            let cut: String = s.chars().take(CITATION_MAX_CHARS).collect();
            format!("{}...", cut)
        }
        Some(s) => s.to_string(),
    }
}

/// Summarizes the collected responses. Writes `final` and `citation`.
pub struct SynthesizeNode {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    memory: Arc<ConversationMemory>,
}

impl SynthesizeNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retry: RetryPolicy,
        memory: Arc<ConversationMemory>,
    ) -> Self {
        Self { llm, retry, memory }
    }
}

#[async_trait]
impl Task for SynthesizeNode {
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        let responses = state
            .get_list("responses")
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .unwrap_or_default();
        let history = self.memory.history_text().await;
        let summary = complete_or_placeholder(
            &*self.llm,
            &self.retry,
            "synthesize",
            prompts::synthesize(&responses, &history),
        )
        .await;
        let citation = citation_for(state);
        Ok(update([("final", json!(summary)), ("citation", json!(citation))]))
    }
}
