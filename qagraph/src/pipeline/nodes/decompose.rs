use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::Task;
use crate::llm::LlmClient;
use crate::pipeline::prompts;
use crate::retry::RetryPolicy;
use crate::state::{update, SharedState, StateUpdate};

use super::complete;

/// Splits the query into sub-questions. Writes `subquestions`.
///
/// Falls back to the query itself as the only sub-question when the model
/// fails or returns nothing usable, so retrieval always has work to do.
pub struct DecomposeNode {
    llm: Arc<dyn LlmClient>,
    retry: RetryPolicy,
    max_subquestions: usize,
}

impl DecomposeNode {
    pub fn new(llm: Arc<dyn LlmClient>, retry: RetryPolicy, max_subquestions: usize) -> Self {
        Self {
            llm,
            retry,
            max_subquestions: max_subquestions.max(1),
        }
    }
}

/// Strips a leading bullet (`-`, `*`, `•`) or number (`1.`, `2)`) from a line.
fn strip_marker(line: &str) -> &str {
    let line = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
        .trim_start();
    let digits = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(r) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return r.trim();
        }
    }
    line
}

/// One sub-question per non-empty line, markers removed, at most `max`.
pub fn parse_subquestions(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(strip_marker)
        .filter(|l| !l.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Task for DecomposeNode {
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        let query = state.require_str("query")?;
        let prompt = prompts::decompose(query, self.max_subquestions);
        let mut subquestions = match complete(&*self.llm, &self.retry, "decompose", prompt).await {
            Ok(text) => parse_subquestions(&text, self.max_subquestions),
            Err(e) => {
                tracing::warn!(error = %e, "decomposition failed; using the query as the only sub-question");
                Vec::new()
            }
        };
        if subquestions.is_empty() {
            subquestions.push(query.to_string());
        }
        tracing::info!(count = subquestions.len(), "decomposed query");
        Ok(update([("subquestions", json!(subquestions))]))
    }
}
