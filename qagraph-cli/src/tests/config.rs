//! Tests for [`RunConfig::apply_options`] and [`config_summary`].

use std::time::Duration;

use crate::{config_summary, RunConfig, RunOptions};

/// **Scenario**: only set options override; stream stays on once set and verbose follows the options.
#[test]
fn apply_options_overrides_only_set_fields() {
    let mut config = RunConfig::default();
    let before = config.pipeline.clone();
    config.apply_options(&RunOptions {
        model: Some("gpt-4o".into()),
        max_enrich_attempts: Some(2),
        stream: true,
        verbose: true,
        ..Default::default()
    });
    assert_eq!(config.pipeline.model, "gpt-4o");
    assert_eq!(config.pipeline.max_enrich_attempts, 2);
    assert_eq!(config.pipeline.max_subquestions, before.max_subquestions);
    assert_eq!(config.pipeline.context_api_url, before.context_api_url);
    assert!(config.stream);
    assert!(config.verbose);

    config.apply_options(&RunOptions::default());
    assert!(config.stream, "stream is not switched off by an unset option");
    assert!(!config.verbose);
}

/// **Scenario**: zero sub-questions is clamped to one.
#[test]
fn apply_options_clamps_max_subquestions() {
    let mut config = RunConfig::default();
    config.apply_options(&RunOptions {
        max_subquestions: Some(0),
        ..Default::default()
    });
    assert_eq!(config.pipeline.max_subquestions, 1);
}

/// **Scenario**: a DB path turns on session persistence.
#[test]
fn db_path_enables_sessions() {
    let mut config = RunConfig::default();
    assert!(!config.persists_sessions());
    config.apply_options(&RunOptions {
        db_path: Some("/tmp/qagraph.db".into()),
        ..Default::default()
    });
    assert!(config.persists_sessions());
}

/// **Scenario**: the summary lists settings in a fixed order and never the API key.
#[test]
fn config_summary_has_stable_keys_and_hides_key() {
    let mut config = RunConfig::default();
    config.pipeline.openai_api_key = Some("sk-secret".into());
    config.pipeline.run_deadline = Some(Duration::from_secs(90));
    let entries = config_summary(&config);
    let keys: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        keys,
        [
            "model",
            "api_base",
            "context_api",
            "max_subquestions",
            "max_enrich_attempts",
            "retry_attempts",
            "deadline",
            "sessions"
        ]
    );
    assert!(entries.iter().all(|(_, v)| !v.contains("sk-secret")));
    assert!(entries.contains(&("deadline", "90s".to_string())));
    assert!(entries.contains(&("sessions", "none".to_string())));
}
