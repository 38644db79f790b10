//! Run context passed into tasks for streaming-aware execution.
//!
//! Holds runnable config and optional stream sender plus selected stream modes.

use std::collections::HashSet;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::stream::{StreamEvent, StreamMode};

use super::RunnableConfig;

#[derive(Clone, Default)]
pub struct RunContext {
    /// Config for the current run (run id, recursion limit, deadline).
    pub config: RunnableConfig,
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent>>,
    /// Enabled stream modes (Values, Updates, Custom).
    pub stream_mode: HashSet<StreamMode>,
}

impl RunContext {
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
        }
    }

    /// Attaches a stream sender; events are sent only for the given modes.
    pub fn with_stream(
        mut self,
        tx: mpsc::Sender<StreamEvent>,
        modes: impl Into<HashSet<StreamMode>>,
    ) -> Self {
        self.stream_tx = Some(tx);
        self.stream_mode = modes.into();
        self
    }

    /// True when a sender is attached and `mode` was requested.
    pub fn wants(&self, mode: StreamMode) -> bool {
        self.stream_tx.is_some() && self.stream_mode.contains(&mode)
    }

    /// Sends `event` if `mode` is enabled. Send errors (consumer dropped) are ignored.
    pub(crate) async fn emit(&self, mode: StreamMode, event: StreamEvent) {
        if !self.wants(mode) {
            return;
        }
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Sends a `StreamEvent::Custom` payload when custom streaming is enabled.
    pub async fn emit_custom(&self, payload: Value) {
        self.emit(StreamMode::Custom, StreamEvent::Custom(payload))
            .await;
    }
}
