//! HTTP API server.
//!
//! Exposes video processing and question answering over JSON.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::{ErrorKind, VidaskError};
use crate::orchestrator::Orchestrator;
use crate::session::HealthReport;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<&str>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or(settings.server.host.as_str()).to_string();
    let port = port.unwrap_or(settings.server.port);
    let cors = cors_layer(&settings.server.allowed_origins);
    let startup_index = settings.rag.startup_index.clone();

    let orchestrator = Orchestrator::new(settings)?;

    if let Some(name) = startup_index {
        match orchestrator.activate(&name).await {
            Ok(count) => info!("Loaded startup index {} ({} chunks)", name, count),
            Err(e) => warn!("Startup index {} not loaded: {}", name, e),
        }
    }

    let app = router(Arc::new(AppState { orchestrator })).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidask API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Liveness", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Process video", "POST /process-video");
    Output::kv("Ask question", "POST /ask-question");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/process-video", post(process_video))
        .route("/ask-question", post(ask_question))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ProcessVideoRequest {
    video_url: String,
}

#[derive(Serialize)]
struct ProcessVideoResponse {
    success: bool,
    message: String,
    video_id: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// A library error rendered as an HTTP response.
struct ApiError(VidaskError);

impl From<VidaskError> for ApiError {
    fn from(e: VidaskError) -> Self {
        Self(e)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Structural | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(VidaskError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "vidask API is running" }))
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthReport>, ApiError> {
    Ok(Json(state.orchestrator.health()?))
}

async fn process_video(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessVideoRequest>, JsonRejection>,
) -> Result<Json<ProcessVideoResponse>, ApiError> {
    let Json(req) = payload?;
    let result = state.orchestrator.process_video(&req.video_url).await?;
    Ok(Json(ProcessVideoResponse {
        success: true,
        message: result.message(),
        video_id: result.video_id,
    }))
}

async fn ask_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(req) = payload?;
    let answer = state.orchestrator.ask(&req.question).await?;
    Ok(Json(AskResponse {
        answer: answer.answer,
    }))
}
