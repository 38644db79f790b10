//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile`. Starts at the entry point, runs each stage,
//! merges its update into the shared state, then follows the node's outgoing
//! transition until `END`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::state::{SharedState, StateUpdate};
use crate::stream::{StreamEvent, StreamMode};

use super::edge::Transition;
use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_state_update,
};
use super::node::NodeKind;
use super::node_middleware::{NodeFuture, NodeMiddleware};
use super::{RunContext, RunnableConfig, END};

/// Compiled graph: immutable structure, one run per `invoke`.
///
/// Cheap to clone (nodes and tasks are shared through `Arc`). The pipeline builds a
/// fresh graph per request so runs never share a plan.
#[derive(Clone)]
pub struct CompiledStateGraph {
    pub(super) nodes: HashMap<String, NodeKind>,
    pub(super) transitions: HashMap<String, Transition>,
    pub(super) entry: String,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware>>,
}

impl CompiledStateGraph {
    /// Name of the first node executed.
    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// Registered node names, sorted.
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs one stage, through the middleware when one is attached.
    async fn run_node(
        &self,
        node_id: &str,
        state: &SharedState,
        ctx: &RunContext,
    ) -> Result<StateUpdate, AgentError> {
        let node = self.nodes.get(node_id).cloned().ok_or_else(|| {
            AgentError::ExecutionFailed(format!("node '{}' missing from compiled graph", node_id))
        })?;
        log_node_start(node_id, node.is_parallel());

        match &self.middleware {
            Some(middleware) => {
                let id = node_id.to_string();
                let ctx_owned = ctx.clone();
                middleware
                    .around_run(
                        node_id,
                        state.clone(),
                        Box::new(move |s: SharedState| {
                            let fut: NodeFuture =
                                Box::pin(async move { node.execute(&id, &s, &ctx_owned).await });
                            fut
                        }),
                    )
                    .await
            }
            None => node.execute(node_id, state, ctx).await,
        }
    }

    /// Picks the node after `node_id` from its transition and the merged state.
    fn next_node(&self, node_id: &str, state: &SharedState) -> Result<String, AgentError> {
        match self.transitions.get(node_id) {
            Some(Transition::Direct(to)) => Ok(to.clone()),
            Some(Transition::Conditional { router, targets }) => {
                let target = router(state);
                if targets.contains(&target) {
                    Ok(target)
                } else {
                    Err(AgentError::InvalidRoute {
                        node: node_id.to_string(),
                        target,
                    })
                }
            }
            None => Err(AgentError::ExecutionFailed(format!(
                "node '{}' has no outgoing edge",
                node_id
            ))),
        }
    }

    /// Shared run loop used by invoke() and stream(): steps through nodes until END.
    /// Returns the number of stages executed.
    async fn run_loop(&self, state: &mut SharedState, ctx: &RunContext) -> Result<usize, AgentError> {
        let limit = ctx.config.recursion_limit;
        let mut current = self.entry.clone();
        let mut steps = 0usize;
        loop {
            if steps >= limit {
                return Err(AgentError::RecursionLimit(limit));
            }
            steps += 1;

            let update = self.run_node(&current, state, ctx).await?;
            let emitted = ctx.wants(StreamMode::Updates).then(|| update.clone());
            log_state_update(&current, update.len());
            state.merge(update);

            if ctx.wants(StreamMode::Values) {
                ctx.emit(StreamMode::Values, StreamEvent::Values(state.clone()))
                    .await;
            }
            if let Some(update) = emitted {
                ctx.emit(
                    StreamMode::Updates,
                    StreamEvent::Updates {
                        node_id: current.clone(),
                        update,
                    },
                )
                .await;
            }

            let next = self.next_node(&current, state)?;
            log_node_complete(&current, &next);
            if next == END {
                return Ok(steps);
            }
            current = next;
        }
    }

    /// Runs the graph with the given state and returns the final state.
    ///
    /// Pass `None` for config to use the defaults (no deadline, default recursion limit).
    pub async fn invoke(
        &self,
        state: SharedState,
        config: Option<RunnableConfig>,
    ) -> Result<SharedState, AgentError> {
        self.invoke_with_context(state, RunContext::new(config.unwrap_or_default()))
            .await
    }

    /// Runs the graph with a caller-built context (e.g. one carrying a stream sender).
    ///
    /// The context is dropped when the run ends, which closes its stream channel.
    /// When `ctx.config.deadline` is set and passes, the run is abandoned
    /// (outstanding stages and branches are dropped) and `Timeout` is returned.
    pub async fn invoke_with_context(
        &self,
        state: SharedState,
        ctx: RunContext,
    ) -> Result<SharedState, AgentError> {
        let run_id = ctx.config.run_id.clone();
        log_graph_start(run_id.as_deref());

        let run = async {
            let mut state = state;
            let steps = self.run_loop(&mut state, &ctx).await?;
            Ok::<_, AgentError>((state, steps))
        };
        let result = match ctx.config.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, run).await {
                Ok(r) => r,
                Err(_) => Err(AgentError::Timeout(deadline)),
            },
            None => run.await,
        };

        match result {
            Ok((state, steps)) => {
                log_graph_complete(run_id.as_deref(), steps);
                Ok(state)
            }
            Err(e) => {
                log_graph_error(run_id.as_deref(), &e);
                Err(e)
            }
        }
    }

    /// Streams graph execution, emitting events via channel-backed Stream.
    ///
    /// A failed run ends the stream with `StreamEvent::Error`.
    pub fn stream(
        &self,
        state: SharedState,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let ctx = RunContext::new(config.unwrap_or_default()).with_stream(tx.clone(), stream_mode);

        tokio::spawn(async move {
            if let Err(e) = graph.invoke_with_context(state, ctx).await {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use tokio_stream::StreamExt;

    use crate::graph::{task_fn, StateGraph, Task, START};
    use crate::state::update;

    fn add(delta: i64) -> Arc<dyn Task> {
        Arc::new(task_fn(move |s: SharedState| async move {
            let n = s.get("n").and_then(|v| v.as_i64()).unwrap_or(0);
            Ok(update([("n", json!(n + delta))]))
        }))
    }

    fn build_two_step_graph() -> CompiledStateGraph {
        let mut graph = StateGraph::new();
        graph.add_node("first", add(1)).unwrap();
        graph.add_node("second", add(2)).unwrap();
        graph.add_edge(START, "first").unwrap();
        graph.add_edge("first", "second").unwrap();
        graph.add_edge("second", END).unwrap();
        graph.compile().expect("graph compiles")
    }

    /// **Scenario**: invoke runs both nodes in edge order.
    #[tokio::test]
    async fn invoke_runs_chain() {
        let out = build_two_step_graph()
            .invoke(SharedState::new(), None)
            .await
            .unwrap();
        assert_eq!(out.get("n"), Some(&json!(3)));
    }

    /// **Scenario**: a conditional self-loop stops once the router sends traffic to END.
    #[tokio::test]
    async fn conditional_loop_until_router_ends() {
        let mut graph = StateGraph::new();
        graph.add_node("inc", add(1)).unwrap();
        graph.set_entry_point("inc").unwrap();
        graph
            .add_conditional_edges("inc", ["inc", END], |s| {
                if s.get("n").and_then(|v| v.as_i64()).unwrap_or(0) < 4 {
                    "inc".to_string()
                } else {
                    END.to_string()
                }
            })
            .unwrap();
        let out = graph
            .compile()
            .unwrap()
            .invoke(SharedState::new(), None)
            .await
            .unwrap();
        assert_eq!(out.get("n"), Some(&json!(4)));
    }

    /// **Scenario**: an unbounded loop fails with RecursionLimit.
    #[tokio::test]
    async fn unbounded_loop_hits_recursion_limit() {
        let mut graph = StateGraph::new();
        graph.add_node("inc", add(1)).unwrap();
        graph.set_entry_point("inc").unwrap();
        graph
            .add_conditional_edges("inc", ["inc", END], |_s| "inc".to_string())
            .unwrap();
        let err = graph
            .compile()
            .unwrap()
            .invoke(
                SharedState::new(),
                Some(RunnableConfig::default().with_recursion_limit(5)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::RecursionLimit(5)), "{:?}", err);
    }

    /// **Scenario**: a router returning an undeclared target fails with InvalidRoute.
    #[tokio::test]
    async fn router_outside_declared_targets_is_invalid_route() {
        let mut graph = StateGraph::new();
        graph.add_node("a", add(1)).unwrap();
        graph.set_entry_point("a").unwrap();
        graph
            .add_conditional_edges("a", [END], |_s| "elsewhere".to_string())
            .unwrap();
        let err = graph
            .compile()
            .unwrap()
            .invoke(SharedState::new(), None)
            .await
            .unwrap_err();
        match err {
            AgentError::InvalidRoute { node, target } => {
                assert_eq!(node, "a");
                assert_eq!(target, "elsewhere");
            }
            other => panic!("expected InvalidRoute, got {:?}", other),
        }
    }

    /// **Scenario**: a deadline shorter than a slow stage yields Timeout.
    #[tokio::test]
    async fn deadline_aborts_run() {
        let slow: Arc<dyn Task> = Arc::new(task_fn(|_s| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(update([("done", json!(true))]))
        }));
        let mut graph = StateGraph::new();
        graph.add_node("slow", slow).unwrap();
        graph.add_edge(START, "slow").unwrap();
        graph.add_edge("slow", END).unwrap();
        let err = graph
            .compile()
            .unwrap()
            .invoke(
                SharedState::new(),
                Some(RunnableConfig::default().with_deadline(Duration::from_millis(20))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout(_)), "{:?}", err);
    }

    /// **Scenario**: stream(Values+Updates) emits Values then Updates per node, in node order.
    #[tokio::test]
    async fn stream_values_and_updates_both_enabled() {
        let graph = build_two_step_graph();
        let stream = graph.stream(
            SharedState::new(),
            None,
            HashSet::from_iter([StreamMode::Values, StreamMode::Updates]),
        );
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 4, "two nodes: two Values + two Updates");
        match &events[0] {
            StreamEvent::Values(s) => assert_eq!(s.get("n"), Some(&json!(1))),
            other => panic!("events[0] should be Values, got {:?}", other),
        }
        match &events[1] {
            StreamEvent::Updates { node_id, update } => {
                assert_eq!(node_id, "first");
                assert_eq!(update["n"], 1);
            }
            other => panic!("events[1] should be Updates, got {:?}", other),
        }
        match &events[3] {
            StreamEvent::Updates { node_id, .. } => assert_eq!(node_id, "second"),
            other => panic!("events[3] should be Updates, got {:?}", other),
        }
    }

    /// **Scenario**: a failing stage ends the stream with an Error event.
    #[tokio::test]
    async fn stream_ends_with_error_event_on_failure() {
        let failing: Arc<dyn Task> = Arc::new(task_fn(|_s| async move {
            Err(AgentError::ExecutionFailed("kaput".into()))
        }));
        let mut graph = StateGraph::new();
        graph.add_node("bad", failing).unwrap();
        graph.add_edge(START, "bad").unwrap();
        graph.add_edge("bad", END).unwrap();
        let events: Vec<_> = graph
            .compile()
            .unwrap()
            .stream(SharedState::new(), None, HashSet::from_iter([StreamMode::Values]))
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error(msg) => assert!(msg.contains("kaput"), "{}", msg),
            other => panic!("expected Error event, got {:?}", other),
        }
    }

    /// **Scenario**: tasks can emit Custom events through the run context.
    #[tokio::test]
    async fn custom_events_reach_the_stream() {
        struct Announce;

        #[async_trait::async_trait]
        impl Task for Announce {
            async fn run(&self, _state: &SharedState) -> Result<StateUpdate, AgentError> {
                Ok(update([("said", json!(true))]))
            }

            async fn run_with_context(
                &self,
                state: &SharedState,
                ctx: &RunContext,
            ) -> Result<StateUpdate, AgentError> {
                ctx.emit_custom(json!({"hello": "world"})).await;
                self.run(state).await
            }
        }

        let mut graph = StateGraph::new();
        graph.add_node("announce", Arc::new(Announce)).unwrap();
        graph.add_edge(START, "announce").unwrap();
        graph.add_edge("announce", END).unwrap();
        let events: Vec<_> = graph
            .compile()
            .unwrap()
            .stream(SharedState::new(), None, HashSet::from_iter([StreamMode::Custom]))
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Custom(v) if v["hello"] == "world"));
    }
}
