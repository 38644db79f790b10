//! Question-answering pipeline built on the graph engine.
//!
//! A query is decomposed into sub-questions, each answered in parallel, the
//! answers summarized and the summary validated. When the validator asks for
//! more context the run fetches external context and goes back to retrieval
//! (bounded by `max_enrich_attempts`), then explains the summary.
//!
//! - [`PipelineConfig`]: settings from the environment.
//! - [`Models`], [`build_models`]: one model client per agent.
//! - [`build_graph`]: the stage graph for one run.
//! - [`PipelineRunner`]: runs a request and records the session outcome.

mod build;
mod config;
mod models;
pub mod nodes;
pub mod prompts;
mod runner;

pub use build::{build_graph, route_after_enrich, route_after_validate, PipelineDeps};
pub use config::{
    stages_needed, ConfigError, PipelineConfig, DEFAULT_MAX_ENRICH_ATTEMPTS,
    DEFAULT_MAX_SUBQUESTIONS, DEFAULT_MODEL,
};
pub use models::{build_models, BuildModelsError, Models};
pub use runner::{PipelineOutput, PipelineRequest, PipelineRunner, RunError};

pub const DECOMPOSE: &str = "decompose";
pub const RETRIEVE: &str = "retrieve";
pub const SYNTHESIZE: &str = "synthesize";
pub const VALIDATE: &str = "validate";
pub const ENRICH: &str = "enrich";
pub const EXPLAIN: &str = "explain";
