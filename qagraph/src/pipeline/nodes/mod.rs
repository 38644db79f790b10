//! Pipeline stages. Each stage is a [`Task`](crate::graph::Task) reading the
//! shared state and returning the keys it owns.

mod decompose;
mod enrich;
mod explain;
mod retrieve;
mod synthesize;
mod validate;

pub use decompose::{parse_subquestions, DecomposeNode};
pub use enrich::EnrichNode;
pub use explain::ExplainNode;
pub use retrieve::RetrieveNode;
pub use synthesize::{citation_for, SynthesizeNode, CITATION_MAX_CHARS, NO_CITATION};
pub use validate::{needs_more_context, ValidateNode};

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::retry::RetryPolicy;

async fn ask(llm: &dyn LlmClient, messages: &[Message]) -> Result<String, AgentError> {
    llm.invoke(messages)
        .await
        .map(|r| r.content.trim().to_string())
}

/// One user-turn model call with retries; returns the trimmed reply.
pub(crate) async fn complete(
    llm: &dyn LlmClient,
    retry: &RetryPolicy,
    what: &str,
    prompt: String,
) -> Result<String, AgentError> {
    let messages = [Message::user(prompt)];
    let messages = &messages;
    retry.execute(what, move || ask(llm, messages)).await
}

/// Like [`complete`] but yields `"[Error: ...]"` once retries are exhausted.
pub(crate) async fn complete_or_placeholder(
    llm: &dyn LlmClient,
    retry: &RetryPolicy,
    what: &str,
    prompt: String,
) -> String {
    let messages = [Message::user(prompt)];
    let messages = &messages;
    retry
        .execute_or_placeholder(what, move || ask(llm, messages))
        .await
}
