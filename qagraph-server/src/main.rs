//! qagraph HTTP server.
//!
//! Configure via env (or `.env`): OPENAI_API_KEY, OPENAI_API_BASE, OPENAI_MODEL,
//! CONTEXT_API_URL, DB_PATH, LISTEN, LOG_FILE. See `PipelineConfig::from_env`.

use std::sync::Arc;
use std::time::Duration;

use qagraph::memory::{InMemoryStore, SessionStore, SqliteStore, Store};
use qagraph::pipeline::{build_models, PipelineConfig, PipelineDeps, PipelineRunner};
use qagraph::HttpContextSource;
use qagraph_server::{app, logging, AppState};
use tracing::info;

/// Context fetches give up after this long; the enrich stage then routes to explain.
const CONTEXT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Load .env from current directory; if not found, try parent (workspace root when run from crate dir).
fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();

    if std::env::var("LOG_FILE").is_err() {
        eprintln!("qagraph-server: LOG_FILE not set, logging to stdout only.");
    }
    logging::init_tracing()?;

    let config = PipelineConfig::from_env()?;
    let models = build_models(&config)?;

    let store: Arc<dyn Store> = match config.db_path.as_deref() {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => Arc::new(InMemoryStore::new()),
    };
    let sessions = SessionStore::new(store);

    let http_client = reqwest::Client::builder()
        .timeout(CONTEXT_FETCH_TIMEOUT)
        .build()?;
    let context = HttpContextSource::with_client(http_client, config.context_api_url.clone());

    info!(
        model = %config.model,
        base_url = ?config.openai_api_base,
        context_api = %config.context_api_url,
        db_path = ?config.db_path,
        max_subquestions = config.max_subquestions,
        max_enrich_attempts = config.max_enrich_attempts,
        "pipeline config loaded"
    );

    let deps = PipelineDeps {
        models,
        context: Arc::new(context),
        sessions: Some(sessions.clone()),
    };
    let state = Arc::new(AppState::new(PipelineRunner::new(deps, config), sessions));

    let listen = std::env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:8123".to_string());
    info!("listening on http://{}", listen);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
