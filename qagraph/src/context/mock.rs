use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ContextError, ContextSource};

/// Scripted context source: always the same text, or always a failure.
pub struct MockContextSource {
    reply: Result<String, u16>,
    calls: AtomicUsize,
}

impl MockContextSource {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every fetch with `ContextError::Status(status)`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextSource for MockContextSource {
    async fn fetch(&self, _query: &str) -> Result<String, ContextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(ContextError::Status)
    }
}
