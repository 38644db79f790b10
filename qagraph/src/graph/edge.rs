//! Outgoing transitions: a plain edge or a conditional edge with a router.

use std::sync::Arc;

use crate::state::SharedState;

/// Router for a conditional edge: reads the merged state and names the next node
/// (or `END`). Must return one of the targets declared with the edge.
pub type RouteFn = Arc<dyn Fn(&SharedState) -> String + Send + Sync>;

/// The single outgoing transition of a node.
#[derive(Clone)]
pub(crate) enum Transition {
    Direct(String),
    Conditional {
        router: RouteFn,
        targets: Vec<String>,
    },
}

impl Transition {
    /// Every node name (or END) this transition can lead to.
    pub(crate) fn targets(&self) -> Vec<&str> {
        match self {
            Transition::Direct(to) => vec![to.as_str()],
            Transition::Conditional { targets, .. } => targets.iter().map(String::as_str).collect(),
        }
    }
}
