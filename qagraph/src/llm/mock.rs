//! Scripted LLM for tests: fixed text, a sequence of texts, or a closure.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{LlmClient, LlmResponse};
use crate::error::AgentError;
use crate::message::Message;

type Responder = Box<dyn Fn(usize, &[Message]) -> Result<String, AgentError> + Send + Sync>;

/// Mock LLM: answers from a script and counts calls.
///
/// **Interaction**: Implements `LlmClient`; used by agent and pipeline tests.
pub struct MockLlm {
    responder: Responder,
    calls: AtomicUsize,
}

impl MockLlm {
    /// Always answers `text`.
    pub fn with_response(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(move |_, _| Ok(text.clone()))
    }

    /// Answers the given texts in order; the last one repeats once the script runs out.
    pub fn with_responses<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        Self::from_fn(move |call, _| {
            texts
                .get(call)
                .or_else(|| texts.last())
                .cloned()
                .ok_or_else(|| AgentError::ExecutionFailed("mock has no responses".into()))
        })
    }

    /// Always fails with `ExecutionFailed(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_, _| Err(AgentError::ExecutionFailed(message.clone())))
    }

    /// Answers with `f(call_index, messages)`; call_index starts at 0.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(usize, &[Message]) -> Result<String, AgentError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of invoke calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let content = (self.responder)(call, messages)?;
        Ok(LlmResponse { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: with_responses walks the script and then repeats the last entry.
    #[tokio::test]
    async fn with_responses_repeats_last() {
        let llm = MockLlm::with_responses(["a", "b"]);
        let msgs = [Message::user("q")];
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "a");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "b");
        assert_eq!(llm.invoke(&msgs).await.unwrap().content, "b");
        assert_eq!(llm.call_count(), 3);
    }

    /// **Scenario**: from_fn sees the prompt messages.
    #[tokio::test]
    async fn from_fn_sees_messages() {
        let llm = MockLlm::from_fn(|_, m| Ok(m[0].content().to_uppercase()));
        let out = llm.invoke(&[Message::user("loud")]).await.unwrap();
        assert_eq!(out.content, "LOUD");
    }

    /// **Scenario**: failing always errors and still counts the call.
    #[tokio::test]
    async fn failing_errors() {
        let llm = MockLlm::failing("down");
        assert!(llm.invoke(&[]).await.is_err());
        assert_eq!(llm.call_count(), 1);
    }
}
