//! Assembles the question-answering graph for one run.

use std::sync::Arc;

use crate::context::ContextSource;
use crate::graph::{
    CompilationError, CompiledStateGraph, LoggingNodeMiddleware, StateGraph, END, START,
};
use crate::memory::{ConversationMemory, SessionStore};
use crate::retry::RetryPolicy;
use crate::state::SharedState;

use super::config::PipelineConfig;
use super::models::Models;
use super::nodes::{
    DecomposeNode, EnrichNode, ExplainNode, RetrieveNode, SynthesizeNode, ValidateNode,
};
use super::{DECOMPOSE, ENRICH, EXPLAIN, RETRIEVE, SYNTHESIZE, VALIDATE};

/// Collaborators shared by every run: model clients, the context source and
/// (optionally) session persistence.
#[derive(Clone)]
pub struct PipelineDeps {
    pub models: Models,
    pub context: Arc<dyn ContextSource>,
    pub sessions: Option<SessionStore>,
}

/// Router after validation: enrich while the validator asks for more context and
/// attempts remain, otherwise explain.
pub fn route_after_validate(max_enrich_attempts: u64) -> impl Fn(&SharedState) -> String {
    move |state| {
        let wants_more = state.get_bool("needs_more_context").unwrap_or(false);
        let attempts = state.get_u64("enrich_attempts").unwrap_or(0);
        if wants_more && attempts < max_enrich_attempts {
            ENRICH.to_string()
        } else {
            EXPLAIN.to_string()
        }
    }
}

/// Router after enrichment: retrieve again with the new context, or give up and explain.
pub fn route_after_enrich(state: &SharedState) -> String {
    if state.get_bool("context_fetched").unwrap_or(false) {
        RETRIEVE.to_string()
    } else {
        EXPLAIN.to_string()
    }
}

/// Builds and compiles the pipeline graph around a fresh conversation memory.
///
/// ```text
/// decompose -> retrieve (parallel) -> synthesize -> validate
/// validate -> enrich | explain
/// enrich   -> retrieve | explain
/// explain  -> END
/// ```
pub fn build_graph(
    deps: &PipelineDeps,
    memory: Arc<ConversationMemory>,
    config: &PipelineConfig,
) -> Result<CompiledStateGraph, CompilationError> {
    let retry = RetryPolicy::new(config.retry.clone());
    let models = &deps.models;

    let mut graph = StateGraph::new().with_middleware(Arc::new(LoggingNodeMiddleware));
    graph
        .add_node(
            DECOMPOSE,
            Arc::new(DecomposeNode::new(
                models.decomposer.clone(),
                retry.clone(),
                config.max_subquestions,
            )),
        )?
        .add_parallel_node(
            RETRIEVE,
            RetrieveNode::new(models.retriever.clone(), retry.clone(), memory.clone())
                .into_group(),
        )?
        .add_node(
            SYNTHESIZE,
            Arc::new(SynthesizeNode::new(
                models.synthesizer.clone(),
                retry.clone(),
                memory.clone(),
            )),
        )?
        .add_node(
            VALIDATE,
            Arc::new(ValidateNode::new(models.validator.clone(), retry.clone())),
        )?
        .add_node(
            ENRICH,
            Arc::new(EnrichNode::new(deps.context.clone(), deps.sessions.clone())),
        )?
        .add_node(
            EXPLAIN,
            Arc::new(ExplainNode::new(models.explainer.clone(), retry, memory)),
        )?;

    graph
        .add_edge(START, DECOMPOSE)?
        .add_edge(DECOMPOSE, RETRIEVE)?
        .add_edge(RETRIEVE, SYNTHESIZE)?
        .add_edge(SYNTHESIZE, VALIDATE)?
        .add_conditional_edges(
            VALIDATE,
            [ENRICH, EXPLAIN],
            route_after_validate(config.max_enrich_attempts),
        )?
        .add_conditional_edges(ENRICH, [RETRIEVE, EXPLAIN], route_after_enrich)?
        .add_edge(EXPLAIN, END)?;

    graph.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::context::MockContextSource;
    use crate::llm::MockLlm;

    fn state(v: serde_json::Value) -> SharedState {
        SharedState::try_from(v).unwrap()
    }

    /// **Scenario**: validate routes to enrich only while attempts remain.
    #[test]
    fn validate_router_respects_attempts() {
        let route = route_after_validate(1);
        assert_eq!(route(&state(json!({"needs_more_context": true}))), ENRICH);
        assert_eq!(
            route(&state(json!({"needs_more_context": true, "enrich_attempts": 1}))),
            EXPLAIN
        );
        assert_eq!(route(&state(json!({"needs_more_context": false}))), EXPLAIN);
        assert_eq!(route_after_validate(0)(&state(json!({"needs_more_context": true}))), EXPLAIN);
    }

    /// **Scenario**: enrich routes back to retrieve only when context was fetched.
    #[test]
    fn enrich_router_follows_fetch_result() {
        assert_eq!(route_after_enrich(&state(json!({"context_fetched": true}))), RETRIEVE);
        assert_eq!(route_after_enrich(&state(json!({"context_fetched": false}))), EXPLAIN);
    }

    /// **Scenario**: the graph compiles with decompose as entry and all six stages.
    #[test]
    fn graph_compiles() {
        let deps = PipelineDeps {
            models: Models::shared(Arc::new(MockLlm::with_response("x"))),
            context: Arc::new(MockContextSource::with_text("ctx")),
            sessions: None,
        };
        let g = build_graph(&deps, Arc::new(ConversationMemory::new()), &PipelineConfig::default())
            .unwrap();
        assert_eq!(g.entry_point(), DECOMPOSE);
        let mut names = g.node_names();
        names.sort();
        assert_eq!(
            names,
            vec![DECOMPOSE, ENRICH, EXPLAIN, RETRIEVE, SYNTHESIZE, VALIDATE]
        );
    }
}
