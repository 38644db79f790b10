//! Optional overrides for a run (CLI args or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options) and
//! [`run_with_options`](crate::run_with_options).

/// Overrides applied on top of the env-based config. Only set fields override.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Model name for every agent.
    pub model: Option<String>,
    /// Upper bound on sub-questions from the decomposer.
    pub max_subquestions: Option<usize>,
    /// How many enrichment round trips the validator may request.
    pub max_enrich_attempts: Option<u64>,
    /// Context API endpoint used by the enrich stage.
    pub context_api_url: Option<String>,
    /// SQLite path for session results.
    pub db_path: Option<String>,
    /// Print stage progress while running.
    pub stream: bool,
    /// Debug logs for stage enter/exit and routing.
    pub verbose: bool,
}
