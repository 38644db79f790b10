//! Append-only conversation buffer shared by the agents of one run.

use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::message::Message;

/// User/AI turns recorded during one pipeline run.
///
/// **Interaction**: Held as `Arc<ConversationMemory>` by the retriever,
/// synthesizer and explainer. Retriever branches append concurrently; turns are
/// appended as pairs so a question is always followed by its answer.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    messages: RwLock<Vec<Message>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user_message(&self, content: impl Into<String>) {
        self.messages.write().await.push(Message::user(content));
    }

    pub async fn add_ai_message(&self, content: impl Into<String>) {
        self.messages.write().await.push(Message::assistant(content));
    }

    /// Appends a question and its answer under one lock.
    pub async fn add_exchange(&self, question: impl Into<String>, answer: impl Into<String>) {
        let mut messages = self.messages.write().await;
        messages.push(Message::user(question));
        messages.push(Message::assistant(answer));
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// History as prompt text: one `User: ...` or `AI: ...` line per message.
    pub async fn history_text(&self) -> String {
        self.messages
            .read()
            .await
            .iter()
            .filter_map(|m| match m {
                Message::User(s) => Some(format!("User: {}", s)),
                Message::Assistant(s) => Some(format!("AI: {}", s)),
                Message::System(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Memory trace stored with the session result: `{"history": [{role, content}, ...]}`.
    pub async fn to_json(&self) -> Value {
        let messages = self.messages.read().await;
        json!({ "history": &*messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: history renders User/AI lines in insertion order.
    #[tokio::test]
    async fn history_text_renders_lines() {
        let mem = ConversationMemory::new();
        assert_eq!(mem.history_text().await, "");
        mem.add_exchange("what is x?", "x is y.").await;
        mem.add_user_message("and z?").await;
        assert_eq!(
            mem.history_text().await,
            "User: what is x?\nAI: x is y.\nUser: and z?"
        );
        assert_eq!(mem.len().await, 3);
    }

    /// **Scenario**: the memory trace lists every message with its role.
    #[tokio::test]
    async fn to_json_lists_history() {
        let mem = ConversationMemory::new();
        mem.add_user_message("q").await;
        mem.add_ai_message("a").await;
        let v = mem.to_json().await;
        assert_eq!(v["history"][0], json!({"role": "user", "content": "q"}));
        assert_eq!(v["history"][1], json!({"role": "assistant", "content": "a"}));
    }
}
