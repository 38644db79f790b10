//! Invoke: chain order, last-writer-wins merge, idempotent compile.

use qagraph::{StateGraph, END, START};
use serde_json::json;

use crate::common::{append, state, write};

/// **Scenario**: A -> B -> C -> END appends names in order.
#[tokio::test]
async fn chain_runs_in_order() {
    let mut graph = StateGraph::new();
    graph
        .add_node("A", append("A"))
        .unwrap()
        .add_node("B", append("B"))
        .unwrap()
        .add_node("C", append("C"))
        .unwrap();
    graph
        .add_edge(START, "A")
        .unwrap()
        .add_edge("A", "B")
        .unwrap()
        .add_edge("B", "C")
        .unwrap()
        .add_edge("C", END)
        .unwrap();
    let out = graph
        .compile()
        .unwrap()
        .invoke(state(json!({"trace": []})), None)
        .await
        .unwrap();
    assert_eq!(out.get("trace"), Some(&json!(["A", "B", "C"])));
}

/// **Scenario**: a later stage's write replaces an earlier one; untouched keys survive.
#[tokio::test]
async fn later_update_overwrites_earlier() {
    let mut graph = StateGraph::new();
    graph.add_node("first", write("k", "v1")).unwrap();
    graph.add_node("second", write("k", "v2")).unwrap();
    graph.add_edge(START, "first").unwrap();
    graph.add_edge("first", "second").unwrap();
    graph.add_edge("second", END).unwrap();
    let out = graph
        .compile()
        .unwrap()
        .invoke(state(json!({"keep": 1})), None)
        .await
        .unwrap();
    assert_eq!(out.get_str("k"), Some("v2"));
    assert_eq!(out.get("keep"), Some(&json!(1)));
}

/// **Scenario**: compiling the same definition twice gives graphs that behave the same.
#[tokio::test]
async fn compile_is_idempotent() {
    let mut graph = StateGraph::new();
    graph.add_node("A", append("A")).unwrap();
    graph.add_node("B", append("B")).unwrap();
    graph.add_edge(START, "A").unwrap();
    graph.add_edge("A", "B").unwrap();
    graph.add_edge("B", END).unwrap();

    let first = graph.compile().unwrap();
    let second = graph.compile().unwrap();
    let a = first.invoke(state(json!({})), None).await.unwrap();
    let b = second.invoke(state(json!({})), None).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(first.node_names(), second.node_names());
}
