//! HTTP trigger for scheduled runs.
//!
//! A cron service (or anything else that can issue a GET) starts a pipeline
//! run by requesting `/api/process`. Each request is one independent run.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/process` | Run the pipeline once |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Responses
//!
//! ```json
//! { "status": "ok", "processed": 2, "time": "2026-10-19T09:30:00.123+02:00" }
//! ```
//!
//! Any failure during the run is reported as `500` with
//! `{ "error": "<message>" }`; drafts written before the failure stay.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::pipeline::Drafter;

/// Builds the router. Exposed separately from [`run_server`] so tests can
/// serve it on their own listener.
pub fn router(drafter: Drafter) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/process", get(handle_process))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(drafter)
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(drafter: Drafter) -> anyhow::Result<()> {
    let bind_addr = drafter.config().server.bind.clone();
    let app = router(drafter);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);
    println!("Drafter listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// A failed run, rendered as `500 {"error": ...}`.
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: format!("{:#}", self.0),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// ============ GET /api/process ============

#[derive(Serialize)]
struct ProcessResponse {
    status: &'static str,
    processed: usize,
    time: String,
}

async fn handle_process(State(drafter): State<Drafter>) -> Result<Json<ProcessResponse>, AppError> {
    let processed = drafter.run().await.map_err(|e| {
        tracing::error!("run failed: {e:#}");
        AppError(e)
    })?;

    Ok(Json(ProcessResponse {
        status: "ok",
        processed,
        time: chrono::Local::now().to_rfc3339(),
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
