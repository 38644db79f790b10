//! Pipeline configuration from environment variables (and `.env`).

use std::time::Duration;

use crate::context::DEFAULT_CONTEXT_API_URL;
use crate::graph::{RunnableConfig, DEFAULT_RECURSION_LIMIT};
use crate::retry::RetryConfig;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_SUBQUESTIONS: usize = 3;
pub const DEFAULT_MAX_ENRICH_ATTEMPTS: u64 = 1;

/// Invalid value for a configuration variable.
#[derive(Debug, thiserror::Error)]
#[error("invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Settings shared by every run of the question-answering pipeline.
///
/// **Interaction**: Built once by the server or CLI via [`PipelineConfig::from_env`];
/// read by `build_models`, `build_graph` and `PipelineRunner`.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// `OPENAI_API_KEY`; required only for the real model client.
    pub openai_api_key: Option<String>,
    /// `OPENAI_API_BASE`, for OpenAI-compatible endpoints.
    pub openai_api_base: Option<String>,
    pub model: String,
    pub context_api_url: String,
    pub max_subquestions: usize,
    /// How many times the validator may send the run back through enrichment.
    pub max_enrich_attempts: u64,
    pub retry: RetryConfig,
    pub run_deadline: Option<Duration>,
    pub recursion_limit: usize,
    /// `DB_PATH`; `None` keeps sessions in memory.
    pub db_path: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_base: None,
            model: DEFAULT_MODEL.to_string(),
            context_api_url: DEFAULT_CONTEXT_API_URL.to_string(),
            max_subquestions: DEFAULT_MAX_SUBQUESTIONS,
            max_enrich_attempts: DEFAULT_MAX_ENRICH_ATTEMPTS,
            retry: RetryConfig::default(),
            run_deadline: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            db_path: None,
        }
    }
}

/// Stages a run takes when every enrichment round is used: decompose, retrieve,
/// synthesize, validate and explain, plus enrich, retrieve, synthesize and
/// validate again per round.
pub fn stages_needed(max_enrich_attempts: u64) -> usize {
    let rounds = usize::try_from(max_enrich_attempts).unwrap_or(usize::MAX);
    rounds.saturating_mul(4).saturating_add(5)
}

fn parse<T>(key: &str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError {
            key: key.to_string(),
            reason: e.to_string(),
            value,
        }),
    }
}

impl PipelineConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable lookup; unset or empty variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let mut retry = defaults.retry.clone();
        if let Some(n) = parse::<u32>("RETRY_MAX_ATTEMPTS", lookup("RETRY_MAX_ATTEMPTS"))? {
            retry = retry.with_max_attempts(n);
        }
        if let Some(ms) = parse::<u64>("RETRY_BASE_DELAY_MS", lookup("RETRY_BASE_DELAY_MS"))? {
            retry = retry.with_base_delay(Duration::from_millis(ms));
        }

        let config = Self {
            openai_api_key: text("OPENAI_API_KEY"),
            openai_api_base: text("OPENAI_API_BASE"),
            model: text("OPENAI_MODEL").unwrap_or(defaults.model),
            context_api_url: text("CONTEXT_API_URL").unwrap_or(defaults.context_api_url),
            max_subquestions: parse("MAX_SUBQUESTIONS", lookup("MAX_SUBQUESTIONS"))?
                .unwrap_or(defaults.max_subquestions)
                .max(1),
            max_enrich_attempts: parse("MAX_ENRICH_ATTEMPTS", lookup("MAX_ENRICH_ATTEMPTS"))?
                .unwrap_or(defaults.max_enrich_attempts),
            retry,
            run_deadline: parse::<u64>("RUN_DEADLINE_SECS", lookup("RUN_DEADLINE_SECS"))?
                .map(Duration::from_secs),
            recursion_limit: parse("RECURSION_LIMIT", lookup("RECURSION_LIMIT"))?
                .unwrap_or(defaults.recursion_limit),
            db_path: text("DB_PATH"),
        };
        let needed = stages_needed(config.max_enrich_attempts);
        if config.recursion_limit < needed {
            tracing::warn!(
                recursion_limit = config.recursion_limit,
                max_enrich_attempts = config.max_enrich_attempts,
                raised_to = needed,
                "recursion limit below the enrichment bound; runs use the higher value"
            );
        }
        Ok(config)
    }

    /// Recursion limit actually used: never below [`stages_needed`] so the
    /// enrichment bound, not the limit, ends the loop.
    pub fn effective_recursion_limit(&self) -> usize {
        self.recursion_limit
            .max(stages_needed(self.max_enrich_attempts))
    }

    /// Executor settings for one run.
    pub fn runnable_config(&self, run_id: impl Into<String>) -> RunnableConfig {
        let config = RunnableConfig::default()
            .with_run_id(run_id)
            .with_recursion_limit(self.effective_recursion_limit());
        match self.run_deadline {
            Some(d) => config.with_deadline(d),
            None => config,
        }
    }
}
