//! `key=value` lines describing a run config, printed to stderr with `--verbose`.

use crate::config::RunConfig;

/// Summary entries in a stable order. The API key is never included.
pub fn config_summary(config: &RunConfig) -> Vec<(&'static str, String)> {
    let p = &config.pipeline;
    vec![
        ("model", p.model.clone()),
        (
            "api_base",
            p.openai_api_base
                .clone()
                .unwrap_or_else(|| "default".to_string()),
        ),
        ("context_api", p.context_api_url.clone()),
        ("max_subquestions", p.max_subquestions.to_string()),
        ("max_enrich_attempts", p.max_enrich_attempts.to_string()),
        ("retry_attempts", p.retry.max_attempts.to_string()),
        (
            "deadline",
            p.run_deadline
                .map(|d| format!("{}s", d.as_secs()))
                .unwrap_or_else(|| "none".to_string()),
        ),
        (
            "sessions",
            p.db_path
                .clone()
                .map(|path| format!("sqlite:{}", path))
                .unwrap_or_else(|| "none".to_string()),
        ),
    ]
}
