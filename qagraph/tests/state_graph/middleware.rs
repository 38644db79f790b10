//! with_middleware().compile(): every stage goes through the middleware.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use qagraph::graph::{NodeMiddleware, NodeRun};
use qagraph::state::{SharedState, StateUpdate};
use qagraph::{AgentError, StateGraph, END, START};
use serde_json::json;

use crate::common::{append, state};

struct Recording(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl NodeMiddleware for Recording {
    async fn around_run(
        &self,
        node_id: &str,
        state: SharedState,
        inner: NodeRun,
    ) -> Result<StateUpdate, AgentError> {
        self.0.lock().unwrap().push(format!("before:{}", node_id));
        let out = inner(state).await;
        self.0.lock().unwrap().push(format!("after:{}", node_id));
        out
    }
}

/// **Scenario**: the middleware wraps each stage in execution order.
#[tokio::test]
async fn middleware_wraps_each_stage() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = StateGraph::new().with_middleware(Arc::new(Recording(log.clone())));
    graph.add_node("a", append("a")).unwrap();
    graph.add_node("b", append("b")).unwrap();
    graph.add_edge(START, "a").unwrap();
    graph.add_edge("a", "b").unwrap();
    graph.add_edge("b", END).unwrap();
    let out = graph.compile().unwrap().invoke(state(json!({})), None).await.unwrap();
    assert_eq!(out.get("trace"), Some(&json!(["a", "b"])));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before:a", "after:a", "before:b", "after:b"]
    );
}
