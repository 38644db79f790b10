//! Run entry points: [`run`], [`run_with_options`], [`run_with_config`] and
//! [`run_with_runner`] for a prebuilt runner.

mod config_summary;
mod progress;
mod report;

use std::io::Write;
use std::sync::Arc;

use qagraph::memory::SessionStore;
use qagraph::pipeline::{build_models, PipelineDeps, PipelineOutput, PipelineRequest, PipelineRunner};
use qagraph::{HttpContextSource, StreamEvent};

use crate::config::{Error, RunConfig, RunOptions};

pub use config_summary::config_summary;
pub use progress::describe_event;
pub use report::render_output;

/// Runs with config from `.env` and the environment.
pub async fn run(request: &PipelineRequest) -> Result<PipelineOutput, Error> {
    let config = RunConfig::from_env()?;
    run_with_config(&config, request).await
}

/// Runs with env config plus `options` applied on top.
pub async fn run_with_options(
    request: &PipelineRequest,
    options: &RunOptions,
) -> Result<PipelineOutput, Error> {
    let mut config = RunConfig::from_env()?;
    config.apply_options(options);
    run_with_config(&config, request).await
}

/// Builds the model clients, context source and (with `DB_PATH`) the session
/// store from `config`, then runs. Does not read `.env`.
pub async fn run_with_config(
    config: &RunConfig,
    request: &PipelineRequest,
) -> Result<PipelineOutput, Error> {
    if config.verbose {
        for (key, value) in config_summary(config) {
            eprintln!("{}={}", key, value);
        }
    }
    let deps = PipelineDeps {
        models: build_models(&config.pipeline)?,
        context: Arc::new(HttpContextSource::new(config.pipeline.context_api_url.clone())),
        sessions: open_sessions(config)?,
    };
    let runner = PipelineRunner::new(deps, config.pipeline.clone());
    run_with_runner(&runner, config.stream, request).await
}

#[cfg(feature = "sqlite")]
fn open_sessions(config: &RunConfig) -> Result<Option<SessionStore>, Error> {
    match config.pipeline.db_path.as_deref() {
        Some(path) => {
            let store = qagraph::SqliteStore::open(path)?;
            Ok(Some(SessionStore::new(Arc::new(store))))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "sqlite"))]
fn open_sessions(config: &RunConfig) -> Result<Option<SessionStore>, Error> {
    if config.persists_sessions() {
        tracing::warn!("DB_PATH is set but qagraph-cli was built without `sqlite`; results are not persisted");
    }
    Ok(None)
}

/// Runs `request` on `runner`. With `stream`, prints one line per stage as it finishes.
pub async fn run_with_runner(
    runner: &PipelineRunner,
    stream: bool,
    request: &PipelineRequest,
) -> Result<PipelineOutput, Error> {
    tracing::debug!(session_id = %request.session_id, stream, "running pipeline");
    let output = if stream {
        runner
            .run_session_with_events(request, |event: &StreamEvent| {
                if let Some(line) = describe_event(event) {
                    let mut out = std::io::stdout();
                    let _ = writeln!(out, "{}", line);
                    let _ = out.flush();
                }
            })
            .await?
    } else {
        runner.run_session(request).await?
    };
    Ok(output)
}
