use async_trait::async_trait;

use super::{ContextError, ContextSource, DEFAULT_CONTEXT_API_URL};

/// Context source backed by an HTTP GET on `{url}?q={query}`; the body is the context.
pub struct HttpContextSource {
    client: reqwest::Client,
    url: String,
}

impl Default for HttpContextSource {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_API_URL)
    }
}

impl HttpContextSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Custom client, e.g. with a request timeout.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContextSource for HttpContextSource {
    async fn fetch(&self, query: &str) -> Result<String, ContextError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| ContextError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContextError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ContextError::Transport(format!("failed to read response: {}", e)))
    }
}
