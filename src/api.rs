//! REST endpoints over the orchestrator.
//!
//! Maps the core's result shapes onto HTTP: missing input is 400, a provider
//! without a connection is 503, a failed provider call is 502. Mount behind
//! the host's authentication layer; this router does none of its own.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::batch::BatchResult;
use crate::config::GenerationOptions;
use crate::orchestrator::Orchestrator;
use crate::provider::{ProviderClient, ProviderKind, TaskRequest};
use crate::status::StatusSnapshot;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the Axum router.
pub fn api_routes(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/analyze-code", post(analyze_code))
        .route("/api/generate-tasks", post(generate_tasks))
        .route("/api/automate-task", post(automate_task))
        .route("/api/review-code", post(review_code))
        .route("/api/batch", post(batch))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Bind `addr` and serve the API until the process exits.
pub async fn serve(orchestrator: Arc<Orchestrator>, addr: SocketAddr) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "API server started");
    axum::serve(listener, api_routes(orchestrator)).await?;
    Ok(())
}

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

fn display_name(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "Gemini",
        ProviderKind::Claude => "Claude",
    }
}

fn require(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

fn ready_client(state: &AppState, kind: ProviderKind) -> Result<Arc<ProviderClient>, ApiError> {
    let client = state.orchestrator.client(kind);
    if client.is_ready() {
        Ok(client)
    } else {
        Err(ApiError::Unavailable(format!("{} not configured", display_name(kind))))
    }
}

/// Run one task; returns the text and the client that produced it.
async fn dispatch(
    state: &AppState,
    request: TaskRequest,
    options: &GenerationOptions,
) -> Result<(String, Arc<ProviderClient>), ApiError> {
    let kind = Orchestrator::provider_for(request.kind);
    let client = ready_client(state, kind)?;
    match client.execute_with(&request, options).await.into_text() {
        Some(text) => Ok((text, client)),
        None => Err(ApiError::Upstream(format!(
            "{} request failed",
            display_name(kind)
        ))),
    }
}

// ── Health / status ─────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "goose-dispatch"
    }))
}

#[derive(Serialize)]
struct StatusDocument {
    status: &'static str,
    #[serde(flatten)]
    snapshot: StatusSnapshot,
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusDocument {
        status: "ok",
        snapshot: state.orchestrator.status(),
    })
}

// ── Single tasks ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    code: Option<String>,
    #[serde(default)]
    instructions: String,
    #[serde(default)]
    options: GenerationOptions,
}

async fn analyze_code(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> Result<impl IntoResponse, ApiError> {
    let code = require(body.code, "Code is required")?;
    let (analysis, client) = dispatch(
        &state,
        TaskRequest::analyze(code, body.instructions),
        &body.options,
    )
    .await?;
    Ok(Json(serde_json::json!({
        "analysis": analysis,
        "model": client.model(),
    })))
}

#[derive(Debug, Deserialize)]
struct GenerateTasksBody {
    requirements: Option<String>,
    #[serde(default)]
    options: GenerationOptions,
}

async fn generate_tasks(
    State(state): State<AppState>,
    Json(body): Json<GenerateTasksBody>,
) -> Result<impl IntoResponse, ApiError> {
    let requirements = require(body.requirements, "Requirements are required")?;
    let (tasks, client) = dispatch(
        &state,
        TaskRequest::generate_tasks(requirements),
        &body.options,
    )
    .await?;
    Ok(Json(serde_json::json!({
        "tasks": tasks,
        "model": client.model(),
    })))
}

#[derive(Debug, Deserialize)]
struct AutomateBody {
    task: Option<String>,
    #[serde(default)]
    context: String,
    #[serde(default)]
    options: GenerationOptions,
}

async fn automate_task(
    State(state): State<AppState>,
    Json(body): Json<AutomateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let task = require(body.task, "Task description is required")?;
    let (result, client) = dispatch(
        &state,
        TaskRequest::automate(task, body.context),
        &body.options,
    )
    .await?;
    Ok(Json(serde_json::json!({
        "result": result,
        "model": client.model(),
        "headless_mode": client.headless_mode(),
    })))
}

#[derive(Debug, Deserialize)]
struct ReviewBody {
    code: Option<String>,
    #[serde(default)]
    requirements: String,
    #[serde(default)]
    options: GenerationOptions,
}

async fn review_code(
    State(state): State<AppState>,
    Json(body): Json<ReviewBody>,
) -> Result<impl IntoResponse, ApiError> {
    let code = require(body.code, "Code is required")?;
    let (review, client) = dispatch(
        &state,
        TaskRequest::review(code, body.requirements),
        &body.options,
    )
    .await?;
    Ok(Json(serde_json::json!({
        "review": review,
        "model": client.model(),
    })))
}

// ── Batch ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BatchBody {
    #[serde(default)]
    tasks: Vec<String>,
}

#[derive(Serialize)]
struct BatchResponse {
    results: BatchResult,
    succeeded: usize,
    failed: usize,
    model: String,
}

async fn batch(
    State(state): State<AppState>,
    Json(body): Json<BatchBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.tasks.iter().any(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Task descriptions must not be empty".to_string(),
        ));
    }
    let client = ready_client(&state, ProviderKind::Claude)?;
    let results = state.orchestrator.run_automation_batch(&body.tasks).await;
    Ok(Json(BatchResponse {
        succeeded: results.succeeded(),
        failed: results.failed(),
        results,
        model: client.model().to_string(),
    }))
}
