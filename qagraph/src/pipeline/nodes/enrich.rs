use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::context::ContextSource;
use crate::error::AgentError;
use crate::graph::{RunContext, Task};
use crate::memory::SessionStore;
use crate::state::{update, SharedState, StateUpdate};

/// Fetches external context for the query.
///
/// Always increments `enrich_attempts` and writes `context_fetched`. On success
/// writes `api_context` and saves it to the session store; a failed fetch is
/// logged and the run continues without it.
pub struct EnrichNode {
    source: Arc<dyn ContextSource>,
    sessions: Option<SessionStore>,
}

impl EnrichNode {
    pub fn new(source: Arc<dyn ContextSource>, sessions: Option<SessionStore>) -> Self {
        Self { source, sessions }
    }

    async fn save(&self, session_id: &str, context: &str) {
        if let Some(sessions) = &self.sessions {
            if let Err(e) = sessions.put_context(session_id, context).await {
                tracing::warn!(session_id, error = %e, "failed to store external context");
            }
        }
    }
}

#[async_trait]
impl Task for EnrichNode {
    async fn run(&self, state: &SharedState) -> Result<StateUpdate, AgentError> {
        self.run_with_context(state, &RunContext::default()).await
    }

    async fn run_with_context(
        &self,
        state: &SharedState,
        ctx: &RunContext,
    ) -> Result<StateUpdate, AgentError> {
        let query = state.require_str("query")?;
        let session_id = state.non_empty_str("session_id").unwrap_or("unknown");
        let attempt = state.get_u64("enrich_attempts").unwrap_or(0) + 1;
        tracing::info!(attempt, "fetching external context");

        let fetched = match self.source.fetch(query).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!(attempt, "external context endpoint returned an empty body");
                None
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "failed to enrich with external context");
                None
            }
        };

        match fetched {
            Some(text) => {
                self.save(session_id, &text).await;
                ctx.emit_custom(json!({"stage": "enrich", "status": "fetched", "attempt": attempt}))
                    .await;
                Ok(update([
                    ("api_context", json!(text)),
                    ("context_fetched", json!(true)),
                    ("enrich_attempts", json!(attempt)),
                ]))
            }
            None => {
                ctx.emit_custom(json!({"stage": "enrich", "status": "failed", "attempt": attempt}))
                    .await;
                Ok(update([
                    ("context_fetched", json!(false)),
                    ("enrich_attempts", json!(attempt)),
                ]))
            }
        }
    }
}
