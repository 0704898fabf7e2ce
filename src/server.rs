//! HTTP server.
//!
//! Exposes the evidence retriever and the fact-check agent as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/verify?q=<query>` | Evidence lookup, returns an [`EvidenceResult`] |
//! | `POST` | `/analyze-with-agent` | One fact-check turn, returns an [`AgentReply`] |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/`, `/static/*` | Landing page assets, when `[server].static_dir` is set |
//!
//! # Error Contract
//!
//! Error responses carry a single `detail` field:
//!
//! ```json
//! { "detail": "Query parameter 'q' is required." }
//! ```
//!
//! `400` for empty input, `503` when evidence retrieval fails. A degraded
//! model answer is *not* an error: it is returned with `200` and
//! `"degraded": true`.
//!
//! # Sessions
//!
//! `POST /analyze-with-agent` reads the session from the `session_id` body
//! field, then the `x-session-id` header. Without either, a new session id
//! is minted and returned in the response.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the landing page can
//! be hosted separately from the API.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{OrchestratorError, RetrievalError};
use crate::llm::create_model;
use crate::models::{AgentReply, EvidenceResult};
use crate::orchestrator::FactChecker;
use crate::search::create_retriever;

/// Header carrying the session id when the body does not.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    checker: Arc<FactChecker>,
}

/// Starts the HTTP server with the retriever and model built from config.
///
/// Fails before binding if any required credential is missing.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let retriever = create_retriever(config)?;
    let model = create_model(config)?;
    info!(
        retriever = retriever.name(),
        model = model.model_name(),
        "fact-check agent configured"
    );

    let checker = Arc::new(FactChecker::from_config(config, retriever, model));
    run_server_with_checker(config, checker).await
}

/// Starts the HTTP server around an existing [`FactChecker`].
///
/// Used by [`run_server`] and by tests that plug in their own retriever
/// or model. Runs until Ctrl-C.
pub async fn run_server_with_checker(
    config: &Config,
    checker: Arc<FactChecker>,
) -> anyhow::Result<()> {
    let app = router(config, checker);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Veritas listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Build the application router.
pub fn router(config: &Config, checker: Arc<FactChecker>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/verify", get(handle_verify))
        .route("/analyze-with-agent", post(handle_analyze))
        .route("/health", get(handle_health));

    if let Some(dir) = &config.server.static_dir {
        app = app
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .nest_service("/static", ServeDir::new(dir));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { checker })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

fn bad_request(detail: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        detail: detail.into(),
    }
}

fn service_unavailable(detail: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        detail: detail.into(),
    }
}

// Malformed bodies keep the `{ "detail": .. }` shape instead of axum's plain text.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidInput(msg) => bad_request(msg),
            OrchestratorError::ServiceUnavailable(msg) => service_unavailable(msg),
        }
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /verify ============

#[derive(Deserialize)]
struct VerifyParams {
    q: Option<String>,
}

/// Handler for `GET /verify`.
///
/// Returns the retriever's [`EvidenceResult`] unchanged, so another
/// instance running a remote retriever sees exactly what a local one would.
async fn handle_verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<EvidenceResult>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(bad_request("Query parameter 'q' is required."));
    }

    match state.checker.retriever().retrieve(&query).await {
        Ok(result) => Ok(Json(result)),
        Err(RetrievalError::InvalidQuery) => Err(bad_request("Query parameter 'q' is required.")),
        Err(RetrievalError::Unavailable(msg)) => {
            Err(service_unavailable(format!("API connection error: {}", msg)))
        }
    }
}

// ============ POST /analyze-with-agent ============

/// Request body for `POST /analyze-with-agent`.
#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// Handler for `POST /analyze-with-agent`.
async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AgentReply>, AppError> {
    let Json(request) = body?;
    let session_id = resolve_session(request.session_id, &headers);

    let turn = state.checker.handle(&session_id, &request.text).await?;

    Ok(Json(AgentReply {
        degraded: turn.answer.is_degraded(),
        agent_response: turn.answer.into_text(),
        session_id: turn.session_id,
    }))
}

fn resolve_session(from_body: Option<String>, headers: &HeaderMap) -> String {
    from_body
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
