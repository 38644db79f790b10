//! Parallel groups inside a compiled graph.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use qagraph::graph::task_fn;
use qagraph::state::{update, SharedState};
use qagraph::{AgentError, ParallelGroup, StateGraph, END, START};
use serde_json::json;

use crate::common::state;

fn single_group_graph(group: ParallelGroup) -> qagraph::CompiledStateGraph {
    let mut graph = StateGraph::new();
    graph.add_parallel_node("fan", group).unwrap();
    graph.add_edge(START, "fan").unwrap();
    graph.add_edge("fan", END).unwrap();
    graph.compile().unwrap()
}

/// **Scenario**: output keeps input order even when the middle branch finishes first.
#[tokio::test]
async fn fan_in_preserves_input_order() {
    let inner = Arc::new(task_fn(|s: SharedState| async move {
        let x = s.require_str("item")?.to_string();
        if x != "x2" {
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        Ok::<_, AgentError>(update([("response", json!(format!("f({})", x)))]))
    }));
    let g = single_group_graph(ParallelGroup::new("items", inner, "results"));
    let out = g
        .invoke(state(json!({"items": ["x1", "x2", "x3"]})), None)
        .await
        .unwrap();
    assert_eq!(out.get("results"), Some(&json!(["f(x1)", "f(x2)", "f(x3)"])));
}

/// **Scenario**: an empty list yields an empty collection and zero branch calls.
#[tokio::test]
async fn empty_fanout_runs_no_branch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let inner = Arc::new(task_fn(move |_s: SharedState| {
        c.fetch_add(1, Ordering::SeqCst);
        async move { Ok(update([("response", json!(1))])) }
    }));
    let g = single_group_graph(ParallelGroup::new("items", inner, "results"));
    let out = g.invoke(state(json!({"items": []})), None).await.unwrap();
    assert_eq!(out.get("results"), Some(&json!([])));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// **Scenario**: branches writing the same key do not see each other's writes and
/// only the collected field reaches the parent.
#[tokio::test]
async fn branches_are_isolated() {
    let inner = Arc::new(task_fn(|s: SharedState| async move {
        assert!(s.get("scratch").is_none(), "branch saw a sibling's write");
        let item = s.get("item").cloned().unwrap_or_default();
        Ok(update([("scratch", json!("dirty")), ("response", item)]))
    }));
    let g = single_group_graph(ParallelGroup::new("items", inner, "results"));
    let out = g
        .invoke(state(json!({"items": [1, 2, 3]})), None)
        .await
        .unwrap();
    assert_eq!(out.get("results"), Some(&json!([1, 2, 3])));
    assert!(out.get("scratch").is_none());
    assert!(out.get("item").is_none());
    assert_eq!(out.get("items"), Some(&json!([1, 2, 3])));
}
