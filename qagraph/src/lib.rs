//! # qagraph
//!
//! Graph-driven question answering in Rust. A small state-graph engine runs a
//! multi-stage pipeline: decompose a question, answer the sub-questions in
//! parallel, synthesize, validate, optionally fetch more context and retry,
//! then explain.
//!
//! ## Design Principles
//!
//! - **One shared state**: every stage reads a JSON key-value state and returns
//!   a partial update; the executor merges it (later keys overwrite).
//! - **Validated graphs**: `StateGraph` rejects unknown nodes, duplicate edges,
//!   unreachable nodes and dead ends before anything runs.
//! - **Ordered fan-out**: a `ParallelGroup` runs one branch per list element on
//!   isolated state copies and collects outputs in input order.
//! - **Explicit loops**: "needs more context" is a conditional edge bounded by an
//!   attempt counter and the recursion limit, not a hidden retry.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `ParallelGroup`, `Task`.
//! - [`pipeline`]: the question-answering stages, graph builder and runner.
//! - [`llm`]: `LlmClient` trait, `MockLlm`, and `ChatOpenAI` (feature `openai`).
//! - [`memory`]: conversation memory and session stores (SQLite with `sqlite`).
//! - [`context`]: external context sources.
//! - [`retry`]: bounded exponential backoff for model calls.
//! - [`stream`]: stream modes and events.
//!
//! ## Features
//!
//! - `sqlite` (default): persistent session store.
//! - `openai`: OpenAI-compatible chat via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qagraph::graph::{task_fn, StateGraph, END, START};
//! use qagraph::state::{update, SharedState};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = StateGraph::new();
//! graph
//!     .add_node("greet", Arc::new(task_fn(|s: SharedState| async move {
//!         let name = s.get_str("name").unwrap_or("world").to_string();
//!         Ok(update([("greeting", json!(format!("hello, {}", name)))]))
//!     })))?
//!     .add_edge(START, "greet")?
//!     .add_edge("greet", END)?;
//! let compiled = graph.compile()?;
//! let out = compiled
//!     .invoke(SharedState::try_from(json!({"name": "rust"}))?, None)
//!     .await?;
//! assert_eq!(out.get_str("greeting"), Some("hello, rust"));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod pipeline;
pub mod retry;
pub mod state;
pub mod stream;

pub use context::{ContextError, ContextSource, HttpContextSource, MockContextSource};
pub use error::AgentError;
pub use graph::{
    BranchFailurePolicy, CompilationError, CompiledStateGraph, ParallelGroup, RunnableConfig,
    StateGraph, Task, END, START,
};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use llm::{LlmClient, LlmResponse, MockLlm};
pub use memory::{
    ConversationMemory, InMemoryStore, SessionRecord, SessionStatus, SessionStore, Store,
    StoreError,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteStore;
pub use message::Message;
pub use pipeline::{PipelineConfig, PipelineDeps, PipelineRequest, PipelineRunner, RunError};
pub use retry::{RetryConfig, RetryPolicy};
pub use state::{SharedState, StateUpdate};
pub use stream::{StreamEvent, StreamMode};
