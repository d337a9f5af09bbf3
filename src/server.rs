//! HTTP API for the ticket assistant.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/resolve` | Run the answering agent for a query |
//! | `POST` | `/report` | Render a markdown incident report for a query |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses use one JSON shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `timeout` (408), `conflict` (409),
//! `provider_error` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::agent::Conversation;
use crate::app::AppContext;
use crate::error::Error;
use crate::report::render_report;

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(ctx: Arc<AppContext>) -> anyhow::Result<()> {
    let bind_addr = ctx.config.server.bind.clone();

    let app = build_router(ctx);

    println!("Server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/resolve", post(handle_resolve))
        .route("/report", post(handle_report))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(ctx)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Maps library errors to the HTTP error contract.
impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) | Error::Usage(msg) => bad_request(msg),
            Error::ProviderTimeout(d) => AppError {
                status: StatusCode::REQUEST_TIMEOUT,
                code: "timeout".to_string(),
                message: Error::ProviderTimeout(d).to_string(),
            },
            Error::IngestInProgress => AppError {
                status: StatusCode::CONFLICT,
                code: "conflict".to_string(),
                message: "an ingestion run is already in progress".to_string(),
            },
            Error::Provider(msg) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "provider_error".to_string(),
                message: msg,
            },
            Error::Corpus(msg) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal".to_string(),
                message: msg,
            },
        }
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

// ============ POST /resolve ============

#[derive(Deserialize)]
struct ResolveRequest {
    query: String,
}

#[derive(Serialize)]
struct ResolveResponse {
    solution: String,
}

/// Handler for `POST /resolve`.
///
/// Runs a single-turn agent session: the agent may search past tickets
/// before answering. Each request gets a fresh conversation; no session
/// state is retained between calls.
async fn handle_resolve(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let mut conversation = Conversation::new();
    let solution = ctx
        .agent
        .respond(&mut conversation, &request.query)
        .await?;

    Ok(Json(ResolveResponse { solution }))
}

// ============ POST /report ============

#[derive(Deserialize)]
struct ReportRequest {
    query: String,
    k: Option<i64>,
}

/// Handler for `POST /report`.
///
/// Retrieves the nearest past tickets and returns the rendered markdown
/// document as `text/markdown`.
async fn handle_report(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, AppError> {
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let k = request.k.unwrap_or(ctx.config.retrieval.k);
    let matches = ctx.pipeline.search(&request.query, k).await?;
    let markdown = render_report(&request.query, &matches, chrono::Utc::now());

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        markdown,
    )
        .into_response())
}
