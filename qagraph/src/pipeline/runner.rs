//! Runs the pipeline for one request and persists its outcome.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::error::AgentError;
use crate::graph::{CompilationError, RunContext};
use crate::memory::{ConversationMemory, SessionRecord, StoreError};
use crate::state::SharedState;
use crate::stream::{StreamEvent, StreamMode};

use super::build::{build_graph, PipelineDeps};
use super::config::PipelineConfig;

/// Error from one pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("graph compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Execution(#[from] AgentError),
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

/// One question to answer.
#[derive(Clone, Debug)]
pub struct PipelineRequest {
    pub query: String,
    /// Paper URL; used as the citation when no external context was fetched.
    pub paper_url: Option<String>,
    pub session_id: String,
}

impl PipelineRequest {
    pub fn new(query: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            paper_url: None,
            session_id: session_id.into(),
        }
    }

    pub fn with_paper_url(mut self, url: Option<String>) -> Self {
        self.paper_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// `{query, session_id, doc_context, enrich_attempts: 0}`.
    pub fn initial_state(&self) -> SharedState {
        let mut state = SharedState::new();
        state.insert("query", json!(self.query));
        state.insert("session_id", json!(self.session_id));
        state.insert("doc_context", json!(self.paper_url));
        state.insert("enrich_attempts", json!(0));
        state
    }
}

/// Final state of a run plus what the session record needs.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub state: SharedState,
    /// `{node, update}` per executed stage, in order.
    pub transitions: Vec<Value>,
    /// Conversation memory trace.
    pub memory: Value,
}

impl PipelineOutput {
    pub fn summary(&self) -> Option<&str> {
        self.state.get_str("final")
    }

    pub fn explanation(&self) -> Option<&str> {
        self.state.get_str("explanation")
    }

    pub fn verdict(&self) -> Option<&str> {
        self.state.get_str("verdict")
    }

    pub fn citation(&self) -> &str {
        self.state.get_str("citation").unwrap_or_default()
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            output: self.state.to_value(),
            state_transitions: self.transitions.clone(),
            memory: self.memory.clone(),
            citation: self.citation().to_string(),
            error: None,
        }
    }
}

/// Builds a fresh graph and conversation memory per request and runs it.
///
/// **Interaction**: Owned by the server (`Arc<PipelineRunner>`) and the CLI.
#[derive(Clone)]
pub struct PipelineRunner {
    deps: PipelineDeps,
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(deps: PipelineDeps, config: PipelineConfig) -> Self {
        Self { deps, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn deps(&self) -> &PipelineDeps {
        &self.deps
    }

    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineOutput, RunError> {
        self.run_with_events(request, |_| {}).await
    }

    /// Runs the pipeline, passing each stage update and custom event to `on_event`
    /// as it happens.
    pub async fn run_with_events<F>(
        &self,
        request: &PipelineRequest,
        mut on_event: F,
    ) -> Result<PipelineOutput, RunError>
    where
        F: FnMut(&StreamEvent),
    {
        if request.query.trim().is_empty() {
            return Err(RunError::InvalidRequest("query must not be empty".into()));
        }
        let memory = Arc::new(ConversationMemory::new());
        let graph = build_graph(&self.deps, memory.clone(), &self.config)?;

        let (tx, mut rx) = mpsc::channel(64);
        let ctx = RunContext::new(self.config.runnable_config(request.session_id.as_str()))
            .with_stream(tx, [StreamMode::Updates, StreamMode::Custom]);

        let mut transitions = Vec::new();
        let run = graph.invoke_with_context(request.initial_state(), ctx);
        let drain = async {
            while let Some(event) = rx.recv().await {
                if let StreamEvent::Updates { node_id, update } = &event {
                    transitions.push(json!({ "node": node_id, "update": update }));
                }
                on_event(&event);
            }
        };
        let (result, ()) = tokio::join!(run, drain);
        let state = result?;

        Ok(PipelineOutput {
            state,
            transitions,
            memory: memory.to_json().await,
        })
    }

    /// Runs and records the outcome in the session store: the result and
    /// `complete`, or the error and `failed`.
    pub async fn run_session(&self, request: &PipelineRequest) -> Result<PipelineOutput, RunError> {
        self.run_session_with_events(request, |_| {}).await
    }

    pub async fn run_session_with_events<F>(
        &self,
        request: &PipelineRequest,
        on_event: F,
    ) -> Result<PipelineOutput, RunError>
    where
        F: FnMut(&StreamEvent),
    {
        let result = self.run_with_events(request, on_event).await;
        if let Some(sessions) = &self.deps.sessions {
            let id = request.session_id.as_str();
            match &result {
                Ok(output) => sessions.complete(id, &output.to_record()).await?,
                Err(e) => {
                    tracing::error!(session_id = id, error = %e, "pipeline run failed");
                    sessions.fail(id, e.to_string()).await?
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MockContextSource;
    use crate::llm::{LlmClient, LlmResponse, MockLlm};
    use crate::message::Message;
    use crate::memory::{InMemoryStore, SessionStatus, SessionStore};
    use crate::pipeline::Models;

    fn runner(llm: MockLlm, sessions: Option<SessionStore>) -> PipelineRunner {
        let deps = PipelineDeps {
            models: Models::shared(Arc::new(llm)),
            context: Arc::new(MockContextSource::with_text("ctx")),
            sessions,
        };
        let mut config = PipelineConfig::default();
        config.retry = config.retry.with_max_attempts(1);
        PipelineRunner::new(deps, config)
    }

    /// **Scenario**: initial state holds query, session id, paper URL and zero attempts.
    #[test]
    fn initial_state_keys() {
        let s = PipelineRequest::new("q", "s1")
            .with_paper_url(Some("http://p".into()))
            .initial_state();
        assert_eq!(s.get_str("query"), Some("q"));
        assert_eq!(s.get_str("session_id"), Some("s1"));
        assert_eq!(s.get_str("doc_context"), Some("http://p"));
        assert_eq!(s.get_u64("enrich_attempts"), Some(0));
        let s = PipelineRequest::new("q", "s1").with_paper_url(Some(" ".into())).initial_state();
        assert_eq!(s.get("doc_context"), Some(&Value::Null));
    }

    /// **Scenario**: an empty query is rejected before anything runs.
    #[tokio::test]
    async fn empty_query_rejected() {
        let llm = MockLlm::with_response("x");
        let r = runner(llm, None);
        let err = r.run(&PipelineRequest::new("  ", "s")).await.unwrap_err();
        assert!(matches!(err, RunError::InvalidRequest(_)));
    }

    /// **Scenario**: a clean run records one transition per stage and completes the session.
    #[tokio::test]
    async fn run_session_records_result() {
        let sessions = SessionStore::new(Arc::new(InMemoryStore::new()));
        let r = runner(MockLlm::with_response("Yes, fine."), Some(sessions.clone()));
        let out = r.run_session(&PipelineRequest::new("q", "s1")).await.unwrap();
        let nodes: Vec<&str> = out
            .transitions
            .iter()
            .filter_map(|t| t["node"].as_str())
            .collect();
        assert_eq!(nodes, ["decompose", "retrieve", "synthesize", "validate", "explain"]);
        assert_eq!(sessions.status("s1").await.unwrap(), Some(SessionStatus::Complete));
        let rec = sessions.result("s1").await.unwrap().unwrap();
        assert_eq!(rec.output["explanation"], "Yes, fine.");
        assert_eq!(rec.citation, "[No citation available]");
        assert_eq!(rec.memory["history"].as_array().map(Vec::len), Some(2));
    }

    /// **Scenario**: a deadline that passes marks the session failed with the timeout.
    #[tokio::test]
    async fn timeout_marks_session_failed() {
        let sessions = SessionStore::new(Arc::new(InMemoryStore::new()));
        struct SlowLlm;

        #[async_trait::async_trait]
        impl LlmClient for SlowLlm {
            async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, AgentError> {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(LlmResponse { content: "slow".into() })
            }
        }

        let deps = PipelineDeps {
            models: Models::shared(Arc::new(SlowLlm)),
            context: Arc::new(MockContextSource::with_text("ctx")),
            sessions: Some(sessions.clone()),
        };
        let mut r = PipelineRunner::new(deps, PipelineConfig::default());
        r.config.run_deadline = Some(std::time::Duration::from_millis(20));
        let err = r.run_session(&PipelineRequest::new("q", "s2")).await.unwrap_err();
        assert!(matches!(err, RunError::Execution(AgentError::Timeout(_))), "{:?}", err);
        assert_eq!(sessions.status("s2").await.unwrap(), Some(SessionStatus::Failed));
        let rec = sessions.result("s2").await.unwrap().unwrap();
        assert!(rec.error.unwrap().contains("timed out"));
    }
}
