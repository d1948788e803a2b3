//! HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | One chat turn; returns the visible reply and an optional file offer |
//! | `POST` | `/api/generate-file` | Resolve and deliver a file (original or synthesized) |
//! | `POST` | `/api/search` | Inspect retrieval for a query |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "unsupported_request", "message": "PDF belgesi bulunamadı. Lütfen yöneticiye bildirin." } }
//! ```
//!
//! Messages are always plain text meant for the end user; internal details
//! go to the log only.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use campus_assist_core::action::FileRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::assistant::{Assistant, SearchOutcome};
use crate::chat::{ChatInput, ChatOutcome};
use crate::config::Config;
use crate::error::AssistError;

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let assistant = Assistant::from_config(config).await?;
    info!(
        model = assistant.model.name(),
        history = assistant.history.is_some(),
        "Assistant ready"
    );

    let app = build_router(AppState::new(assistant));

    println!("Assistant listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The application router, without binding a socket.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/generate-file", post(handle_generate_file))
        .route("/api/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Handler error: an [`AssistError`] rendered as a JSON response.
pub struct AppError(AssistError);

impl From<AssistError> for AppError {
    fn from(err: AssistError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AssistError::NotFound(_) | AssistError::UnsupportedRequest(_) => StatusCode::NOT_FOUND,
            AssistError::Validation(_) => StatusCode::BAD_REQUEST,
            AssistError::Blocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AssistError::UpstreamFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code().to_string(),
                message: self.0.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============ GET /health ============

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

// ============ POST /api/chat ============

async fn handle_chat(
    State(state): State<AppState>,
    Json(input): Json<ChatInput>,
) -> Result<Json<ChatOutcome>, AppError> {
    Ok(Json(state.assistant.chat(input).await?))
}

// ============ POST /api/generate-file ============

async fn handle_generate_file(
    State(state): State<AppState>,
    Json(request): Json<FileRequest>,
) -> Result<Response, AppError> {
    let delivered = state.assistant.fetch(&request).await?;
    let disposition = delivered.content_disposition();

    Ok((
        [
            (header::CONTENT_TYPE, delivered.mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        delivered.bytes,
    )
        .into_response())
}

// ============ POST /api/search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    context: bool,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    if req.query.trim().is_empty() {
        return Err(AssistError::Validation("query must not be empty".to_string()).into());
    }
    Ok(Json(state.assistant.search(&req.query, req.context).await?))
}
