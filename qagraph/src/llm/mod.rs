//! LLM client abstraction used by the pipeline agents.
//!
//! Agents depend on a callable that takes chat messages and returns assistant
//! text. This module defines the trait, a scripted mock for tests, and the
//! OpenAI-compatible client (feature `openai`).

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::MockLlm;

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;

/// Response from an LLM completion.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; agents trim `content`
/// and write it into state or conversation memory.
#[derive(Clone, Debug)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
}

/// LLM client: given messages, returns assistant text.
///
/// Implementations: `MockLlm` (scripted), `ChatOpenAI` (real API, feature `openai`).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn. Aligns with LangChain's `invoke` (single-call API).
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}
