//! Model clients for the five agents, one per sampling temperature.

use std::sync::Arc;

use crate::llm::LlmClient;

use super::config::PipelineConfig;

pub const DECOMPOSER_TEMPERATURE: f32 = 0.0;
pub const RETRIEVER_TEMPERATURE: f32 = 0.0;
pub const SYNTHESIZER_TEMPERATURE: f32 = 0.7;
pub const VALIDATOR_TEMPERATURE: f32 = 0.2;
pub const EXPLAINER_TEMPERATURE: f32 = 0.6;

/// Returned by [`build_models`] when no model can be configured.
#[derive(Debug, thiserror::Error)]
pub enum BuildModelsError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("crate built without the `openai` feature; no model client available")]
    OpenAiDisabled,
}

/// One client per agent. Clients are shared across runs.
#[derive(Clone)]
pub struct Models {
    pub decomposer: Arc<dyn LlmClient>,
    pub retriever: Arc<dyn LlmClient>,
    pub synthesizer: Arc<dyn LlmClient>,
    pub validator: Arc<dyn LlmClient>,
    pub explainer: Arc<dyn LlmClient>,
}

impl Models {
    /// Every agent uses the same client (tests, single-model setups).
    pub fn shared(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            decomposer: llm.clone(),
            retriever: llm.clone(),
            synthesizer: llm.clone(),
            validator: llm.clone(),
            explainer: llm,
        }
    }
}

/// OpenAI-compatible clients at each agent's temperature, from `OPENAI_API_KEY`,
/// `OPENAI_API_BASE` and `OPENAI_MODEL`.
#[cfg(feature = "openai")]
pub fn build_models(config: &PipelineConfig) -> Result<Models, BuildModelsError> {
    use async_openai::config::OpenAIConfig;

    use crate::llm::ChatOpenAI;

    let api_key = config
        .openai_api_key
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(BuildModelsError::MissingApiKey)?;
    let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = config.openai_api_base.as_deref().filter(|s| !s.is_empty()) {
        openai_config = openai_config.with_api_base(base.trim_end_matches('/'));
    }
    let at = |t: f32| -> Arc<dyn LlmClient> {
        Arc::new(ChatOpenAI::with_config(openai_config.clone(), config.model.clone()).with_temperature(t))
    };
    Ok(Models {
        decomposer: at(DECOMPOSER_TEMPERATURE),
        retriever: at(RETRIEVER_TEMPERATURE),
        synthesizer: at(SYNTHESIZER_TEMPERATURE),
        validator: at(VALIDATOR_TEMPERATURE),
        explainer: at(EXPLAINER_TEMPERATURE),
    })
}

#[cfg(not(feature = "openai"))]
pub fn build_models(_config: &PipelineConfig) -> Result<Models, BuildModelsError> {
    Err(BuildModelsError::OpenAiDisabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: without an API key no client is built.
    #[cfg(feature = "openai")]
    #[test]
    fn missing_key_is_error() {
        let err = build_models(&PipelineConfig::default()).err();
        assert!(matches!(err, Some(BuildModelsError::MissingApiKey)));
    }

    /// **Scenario**: with a key every agent gets a client.
    #[cfg(feature = "openai")]
    #[test]
    fn key_builds_all_clients() {
        let config = PipelineConfig {
            openai_api_key: Some("sk-test".into()),
            openai_api_base: Some("http://localhost:9/v1/".into()),
            ..Default::default()
        };
        assert!(build_models(&config).is_ok());
    }

    /// **Scenario**: shared() hands the same client to every agent.
    #[test]
    fn shared_uses_one_client() {
        let llm: Arc<dyn LlmClient> = Arc::new(crate::llm::MockLlm::with_response("x"));
        let m = Models::shared(llm.clone());
        assert!(Arc::ptr_eq(&m.explainer, &llm));
        assert!(Arc::ptr_eq(&m.decomposer, &m.validator));
    }
}
