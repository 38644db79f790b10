//! HTTP surface for the qagraph pipeline.
//!
//! - `POST /query`: start a run in the background; poll its status.
//! - `GET /session/{id}/status`: processing, complete (with result) or failed.
//! - `POST /query/stream`: run and stream stage events as SSE, ending with `done`.
//! - `GET /mcp_context/{id}`: deprecated placeholder.

pub mod logging;

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use qagraph::memory::{SessionStatus, SessionStore, StoreError};
use qagraph::pipeline::{PipelineOutput, PipelineRequest, PipelineRunner, RunError};
use qagraph::StreamEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

/// Shared state for all routes.
pub struct AppState {
    pub runner: Arc<PipelineRunner>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(runner: PipelineRunner, sessions: SessionStore) -> Self {
        Self {
            runner: Arc::new(runner),
            sessions,
        }
    }
}

/// Body of `POST /query` and `POST /query/stream`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub paper_url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl QueryRequest {
    /// Validates the query and assigns a session id (UUID v4 when none was given).
    fn into_pipeline_request(self) -> Result<PipelineRequest, ServerError> {
        if self.query.trim().is_empty() {
            return Err(ServerError::BadRequest("query must not be empty".into()));
        }
        let session_id = self
            .session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(PipelineRequest::new(self.query, session_id).with_paper_url(self.paper_url))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Session not found")]
    SessionNotFound,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("session {0} is complete but has no stored result")]
    MissingResult(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::SessionNotFound => StatusCode::NOT_FOUND,
            ServerError::Store(_) | ServerError::MissingResult(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Logs method and URI at debug, then forwards the request.
async fn log_request(request: Request<Body>, next: Next) -> Response {
    tracing::debug!(method = %request.method(), uri = %request.uri(), "request");
    next.run(request).await
}

/// Builds the router with tracing, CORS and request logging layers.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/query", post(start_query))
        .route("/query/stream", post(stream_query))
        .route("/session/:session_id/status", get(session_status))
        .route("/mcp_context/:session_id", get(mcp_context))
        .layer(middleware::from_fn(log_request))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!("request", method = %req.method(), uri = %req.uri())
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `POST /query`: marks the session processing and runs the pipeline in the background.
async fn start_query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let request = body.into_pipeline_request()?;
    let session_id = request.session_id.clone();
    state
        .sessions
        .set_status(&session_id, SessionStatus::Processing)
        .await?;

    let runner = Arc::clone(&state.runner);
    tokio::spawn(async move {
        if let Err(e) = runner.run_session(&request).await {
            tracing::warn!(session_id = %request.session_id, error = %e, "background run ended with error");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Processing started.",
            "session_id": session_id,
            "status_url": format!("/session/{}/status", session_id),
        })),
    ))
}

/// `GET /session/{id}/status`.
async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let status = state
        .sessions
        .status(&session_id)
        .await?
        .ok_or(ServerError::SessionNotFound)?;
    let body = match status {
        SessionStatus::Processing => json!({ "status": "processing" }),
        SessionStatus::Complete => {
            let record = state
                .sessions
                .result(&session_id)
                .await?
                .ok_or_else(|| ServerError::MissingResult(session_id.clone()))?;
            json!({
                "status": "complete",
                "result": record.output,
                "memory_trace": record.memory,
                "citation": record.citation,
            })
        }
        SessionStatus::Failed => {
            let error = state
                .sessions
                .result(&session_id)
                .await?
                .and_then(|r| r.error)
                .unwrap_or_else(|| "unknown error".to_string());
            json!({ "status": "failed", "error": error })
        }
    };
    Ok(Json(body))
}

/// `GET /mcp_context/{id}`: kept for older clients.
async fn mcp_context(Path(_session_id): Path<String>) -> Json<Value> {
    Json(json!({
        "message": "This endpoint is no longer used. External context is fetched by the pipeline's enrich stage."
    }))
}

/// One SSE frame.
fn sse_frame(event: &str, data: &Value) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// Final `done` frame payload for a finished run.
fn done_payload(session_id: &str, result: &Result<PipelineOutput, RunError>) -> Value {
    match result {
        Ok(out) => json!({
            "session_id": session_id,
            "status": "complete",
            "final": out.summary(),
            "verdict": out.verdict(),
            "explanation": out.explanation(),
            "citation": out.citation(),
        }),
        Err(e) => json!({
            "session_id": session_id,
            "status": "failed",
            "error": e.to_string(),
        }),
    }
}

/// `POST /query/stream`: runs the pipeline and streams `session`, stage and `done` events.
async fn stream_query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> Result<Response, ServerError> {
    let request = body.into_pipeline_request()?;
    let session_id = request.session_id.clone();
    state
        .sessions
        .set_status(&session_id, SessionStatus::Processing)
        .await?;
    tracing::debug!(session_id = %session_id, "streaming query");

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let _ = tx.send(sse_frame("session", &json!({ "session_id": session_id })));

    let runner = Arc::clone(&state.runner);
    tokio::spawn(async move {
        let events = tx.clone();
        let result = runner
            .run_session_with_events(&request, |event: &StreamEvent| {
                let data = serde_json::to_value(event)
                    .ok()
                    .and_then(|mut v| v.get_mut("data").map(Value::take))
                    .unwrap_or(Value::Null);
                let _ = events.send(sse_frame(event.name(), &data));
            })
            .await;
        let _ = tx.send(sse_frame("done", &done_payload(&request.session_id, &result)));
    });

    let stream = UnboundedReceiverStream::new(rx).map(|s| Ok::<_, Infallible>(Bytes::from(s)));
    let mut res = Response::new(Body::from_stream(stream));
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    res.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(res)
}
