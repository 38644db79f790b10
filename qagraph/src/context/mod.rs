//! External context sources used by the enricher stage.
//!
//! A source takes the user's query and returns background text (for example a
//! literature abstract). [`HttpContextSource`] calls a public endpoint;
//! [`MockContextSource`] returns scripted text in tests.

mod http;
mod mock;

pub use http::HttpContextSource;
pub use mock::MockContextSource;

use async_trait::async_trait;

/// Default public context endpoint.
pub const DEFAULT_CONTEXT_API_URL: &str = "https://mcpdemo.fly.dev/api/context/pubmed";

/// Error fetching external context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// Request could not be sent or its body not read.
    #[error("transport error: {0}")]
    Transport(String),
    /// Endpoint answered with a non-success status.
    #[error("context endpoint returned status {0}")]
    Status(u16),
}

/// Fetches external context text for a query.
///
/// **Interaction**: Held as `Arc<dyn ContextSource>` in `PipelineDeps`; called by
/// the enricher stage.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<String, ContextError>;
}
