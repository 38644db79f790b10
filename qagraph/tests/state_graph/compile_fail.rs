//! StateGraph compile failure cases: unknown node, missing entry, dead ends.

use qagraph::{CompilationError, StateGraph, END, START};

use crate::common::append;

/// **Scenario**: an edge to an unregistered node is rejected when it is added.
#[test]
fn edge_to_unknown_node_fails() {
    let mut graph = StateGraph::new();
    graph.add_node("a", append("a")).unwrap();
    graph.add_edge(START, "a").unwrap();
    match graph.add_edge("a", "missing") {
        Err(CompilationError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

/// **Scenario**: a graph without an entry point does not compile.
#[test]
fn missing_entry_point_fails() {
    let mut graph = StateGraph::new();
    graph.add_node("a", append("a")).unwrap();
    graph.add_edge("a", END).unwrap();
    assert_eq!(graph.compile().err(), Some(CompilationError::MissingEntryPoint));
}

/// **Scenario**: registering the same name twice is rejected.
#[test]
fn duplicate_node_fails() {
    let mut graph = StateGraph::new();
    graph.add_node("a", append("a")).unwrap();
    assert_eq!(
        graph.add_node("a", append("a")).err(),
        Some(CompilationError::DuplicateNode("a".into()))
    );
}

/// **Scenario**: a reachable node with no outgoing edge is a dead end.
#[test]
fn dead_end_fails() {
    let mut graph = StateGraph::new();
    graph.add_node("a", append("a")).unwrap();
    graph.add_node("b", append("b")).unwrap();
    graph.add_edge(START, "a").unwrap();
    graph.add_edge("a", "b").unwrap();
    assert_eq!(graph.compile().err(), Some(CompilationError::DeadEnd("b".into())));
}

/// **Scenario**: a node nothing leads to is unreachable.
#[test]
fn unreachable_node_fails() {
    let mut graph = StateGraph::new();
    graph.add_node("a", append("a")).unwrap();
    graph.add_node("orphan", append("o")).unwrap();
    graph.add_edge(START, "a").unwrap();
    graph.add_edge("a", END).unwrap();
    graph.add_edge("orphan", END).unwrap();
    assert_eq!(
        graph.compile().err(),
        Some(CompilationError::UnreachableNode("orphan".into()))
    );
}
