//! Typed session records over a string [`Store`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::{Store, StoreError};

/// Lifecycle of one session as seen by pollers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Processing,
    Complete,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Processing => "processing",
            SessionStatus::Complete => "complete",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(SessionStatus::Processing),
            "complete" => Ok(SessionStatus::Complete),
            "failed" => Ok(SessionStatus::Failed),
            other => Err(StoreError::Serialization(format!(
                "unknown session status '{}'",
                other
            ))),
        }
    }
}

/// Result of one finished run.
///
/// `output` is the final state; `state_transitions` lists `{node, update}` per
/// stage in execution order; `memory` is the conversation trace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub output: Value,
    #[serde(default)]
    pub state_transitions: Vec<Value>,
    #[serde(default)]
    pub memory: Value,
    #[serde(default)]
    pub citation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Session persistence with keys `status:{id}`, `result:{id}` and `context:api:{id}`.
///
/// **Interaction**: Written by the pipeline runner and the enricher; read by the
/// server's status endpoint.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn Store>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn status_key(id: &str) -> String {
        format!("status:{}", id)
    }

    fn result_key(id: &str) -> String {
        format!("result:{}", id)
    }

    fn context_key(id: &str) -> String {
        format!("context:api:{}", id)
    }

    pub async fn set_status(&self, id: &str, status: SessionStatus) -> Result<(), StoreError> {
        tracing::debug!(session_id = id, %status, "session status");
        self.store.put(&Self::status_key(id), status.as_str()).await
    }

    /// `None` when the session was never created.
    pub async fn status(&self, id: &str) -> Result<Option<SessionStatus>, StoreError> {
        self.store
            .get(&Self::status_key(id))
            .await?
            .map(|s| s.parse())
            .transpose()
    }

    pub async fn put_result(&self, id: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.store.put(&Self::result_key(id), &json).await
    }

    pub async fn result(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        match self.store.get(&Self::result_key(id)).await? {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Stores the result and marks the session complete, in that order.
    pub async fn complete(&self, id: &str, record: &SessionRecord) -> Result<(), StoreError> {
        self.put_result(id, record).await?;
        self.set_status(id, SessionStatus::Complete).await
    }

    /// Stores a record carrying only the error and marks the session failed.
    pub async fn fail(&self, id: &str, error: impl Into<String>) -> Result<(), StoreError> {
        let record = SessionRecord {
            error: Some(error.into()),
            ..Default::default()
        };
        self.put_result(id, &record).await?;
        self.set_status(id, SessionStatus::Failed).await
    }

    /// External context fetched for this session by the enricher.
    pub async fn put_context(&self, id: &str, context: &str) -> Result<(), StoreError> {
        self.store.put(&Self::context_key(id), context).await
    }

    pub async fn context(&self, id: &str) -> Result<Option<String>, StoreError> {
        self.store.get(&Self::context_key(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use serde_json::json;

    fn sessions() -> (Arc<InMemoryStore>, SessionStore) {
        let raw = Arc::new(InMemoryStore::new());
        (raw.clone(), SessionStore::new(raw))
    }

    /// **Scenario**: unknown session has no status; processing then complete round-trips.
    #[tokio::test]
    async fn status_and_result_round_trip() {
        let (raw, s) = sessions();
        assert_eq!(s.status("s1").await.unwrap(), None);
        s.set_status("s1", SessionStatus::Processing).await.unwrap();
        assert_eq!(raw.get("status:s1").await.unwrap().as_deref(), Some("processing"));

        let record = SessionRecord {
            output: json!({"final": "summary"}),
            state_transitions: vec![json!({"node": "decompose", "update": {}})],
            memory: json!({"history": []}),
            citation: "[No citation available]".into(),
            error: None,
        };
        s.complete("s1", &record).await.unwrap();
        assert_eq!(s.status("s1").await.unwrap(), Some(SessionStatus::Complete));
        assert_eq!(s.result("s1").await.unwrap(), Some(record));
    }

    /// **Scenario**: fail stores the error and marks the session failed.
    #[tokio::test]
    async fn fail_records_error() {
        let (_, s) = sessions();
        s.fail("s2", "deadline exceeded").await.unwrap();
        assert_eq!(s.status("s2").await.unwrap(), Some(SessionStatus::Failed));
        let rec = s.result("s2").await.unwrap().unwrap();
        assert_eq!(rec.error.as_deref(), Some("deadline exceeded"));
    }

    /// **Scenario**: context is stored under context:api:{id}.
    #[tokio::test]
    async fn context_key_layout() {
        let (raw, s) = sessions();
        s.put_context("s3", "abstract text").await.unwrap();
        assert_eq!(
            raw.get("context:api:s3").await.unwrap().as_deref(),
            Some("abstract text")
        );
        assert_eq!(s.context("s3").await.unwrap().as_deref(), Some("abstract text"));
    }

    /// **Scenario**: a corrupt status value surfaces as a serialization error.
    #[tokio::test]
    async fn unknown_status_is_error() {
        let (raw, s) = sessions();
        raw.put("status:bad", "exploded").await.unwrap();
        assert!(matches!(
            s.status("bad").await,
            Err(StoreError::Serialization(_))
        ));
    }
}
