//! State graph: named nodes + one outgoing transition per node.
//!
//! Add nodes with `add_node` / `add_parallel_node`, set the entry point with
//! `set_entry_point` (or `add_edge(START, first)`), wire nodes with `add_edge`
//! and `add_conditional_edges` using `END` for exit, then `compile` to get a
//! `CompiledStateGraph`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::edge::{RouteFn, Transition};
use crate::graph::node::NodeKind;
use crate::graph::node_middleware::NodeMiddleware;
use crate::graph::{ParallelGroup, Task};
use crate::state::SharedState;

/// Sentinel for graph entry: `add_edge(START, first_node_id)` sets the entry point.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as the target in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// Graph definition. Build it, then `compile()` into an executable graph.
///
/// Each node has at most one outgoing transition: a plain edge or a conditional
/// edge. Loops are only possible through conditional edges and are bounded at
/// run time by the recursion limit.
///
/// **Interaction**: Accepts `Arc<dyn Task>` and [`ParallelGroup`]; produces
/// [`CompiledStateGraph`]. Compiling borrows the definition, so one definition
/// can be compiled any number of times.
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, NodeKind>,
    transitions: HashMap<String, Transition>,
    entry: Option<String>,
    middleware: Option<Arc<dyn NodeMiddleware>>,
}

impl StateGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches node middleware; compiled graphs wrap every stage with it.
    pub fn with_middleware(self, middleware: Arc<dyn NodeMiddleware>) -> Self {
        Self {
            middleware: Some(middleware),
            ..self
        }
    }

    /// Adds a simple stage. Fails with `DuplicateNode` if `id` is taken.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        task: Arc<dyn Task>,
    ) -> Result<&mut Self, CompilationError> {
        self.insert_node(id.into(), NodeKind::Simple(task))
    }

    /// Adds a fan-out/fan-in stage. Fails with `DuplicateNode` if `id` is taken.
    pub fn add_parallel_node(
        &mut self,
        id: impl Into<String>,
        group: ParallelGroup,
    ) -> Result<&mut Self, CompilationError> {
        self.insert_node(id.into(), NodeKind::Parallel(group))
    }

    fn insert_node(&mut self, id: String, kind: NodeKind) -> Result<&mut Self, CompilationError> {
        if id == START || id == END {
            return Err(CompilationError::ReservedName(id));
        }
        if self.nodes.contains_key(&id) {
            return Err(CompilationError::DuplicateNode(id));
        }
        self.nodes.insert(id, kind);
        Ok(self)
    }

    /// Sets the node traversal starts from. Existence is checked by `compile`.
    pub fn set_entry_point(&mut self, id: impl Into<String>) -> Result<&mut Self, CompilationError> {
        let id = id.into();
        match &self.entry {
            Some(existing) if *existing != id => Err(CompilationError::MultipleEntryPoints {
                existing: existing.clone(),
                requested: id,
            }),
            _ => {
                self.entry = Some(id);
                Ok(self)
            }
        }
    }

    /// Adds an edge from `from_id` to `to_id`.
    ///
    /// Both ids must already be registered (`to_id` may be `END`); `from_id` may be
    /// `START`, which sets the entry point. A node can have only one outgoing edge.
    pub fn add_edge(
        &mut self,
        from_id: impl Into<String>,
        to_id: impl Into<String>,
    ) -> Result<&mut Self, CompilationError> {
        let (from_id, to_id) = (from_id.into(), to_id.into());
        if to_id == START {
            return Err(CompilationError::ReservedName(to_id));
        }
        if from_id == START {
            if !self.nodes.contains_key(&to_id) {
                return Err(CompilationError::NodeNotFound(to_id));
            }
            return self.set_entry_point(to_id);
        }
        self.check_source(&from_id)?;
        if to_id != END && !self.nodes.contains_key(&to_id) {
            return Err(CompilationError::NodeNotFound(to_id));
        }
        self.transitions.insert(from_id, Transition::Direct(to_id));
        Ok(self)
    }

    /// Adds a conditional edge: after `from_id` runs, `router` picks the next node
    /// from `targets` (node names or `END`) by reading the merged state.
    pub fn add_conditional_edges<I, T, F>(
        &mut self,
        from_id: impl Into<String>,
        targets: I,
        router: F,
    ) -> Result<&mut Self, CompilationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: Fn(&SharedState) -> String + Send + Sync + 'static,
    {
        let from_id = from_id.into();
        self.check_source(&from_id)?;
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        for t in &targets {
            if t != END && !self.nodes.contains_key(t) {
                return Err(CompilationError::NodeNotFound(t.clone()));
            }
        }
        let router: RouteFn = Arc::new(router);
        self.transitions
            .insert(from_id, Transition::Conditional { router, targets });
        Ok(self)
    }

    fn check_source(&self, from_id: &str) -> Result<(), CompilationError> {
        if from_id == END {
            return Err(CompilationError::ReservedName(from_id.to_string()));
        }
        if !self.nodes.contains_key(from_id) {
            return Err(CompilationError::NodeNotFound(from_id.to_string()));
        }
        if self.transitions.contains_key(from_id) {
            return Err(CompilationError::DuplicateEdge(from_id.to_string()));
        }
        Ok(())
    }

    /// Validates the graph and builds the executable plan.
    ///
    /// Fails when there is no entry point, the entry point is unknown, a node is
    /// unreachable from the entry point, or a reachable node has no outgoing edge.
    pub fn compile(&self) -> Result<CompiledStateGraph, CompilationError> {
        let entry = self
            .entry
            .clone()
            .ok_or(CompilationError::MissingEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(CompilationError::NodeNotFound(entry));
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([entry.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(t) = self.transitions.get(id) {
                queue.extend(t.targets().into_iter().filter(|t| *t != END));
            }
        }

        let mut names: Vec<&String> = self.nodes.keys().collect();
        names.sort();
        if let Some(unreachable) = names.iter().find(|n| !visited.contains(n.as_str())) {
            return Err(CompilationError::UnreachableNode((*unreachable).clone()));
        }
        if let Some(dead_end) = names.iter().find(|n| !self.transitions.contains_key(n.as_str())) {
            return Err(CompilationError::DeadEnd((*dead_end).clone()));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes.clone(),
            transitions: self.transitions.clone(),
            entry,
            middleware: self.middleware.clone(),
        })
    }
}
