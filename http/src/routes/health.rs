use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::{AppState, SERVER_NAME};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    transport: &'static str,
    version: &'static str,
    server: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness probe; reports the transport family and build version.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        transport: "http",
        version: env!("CARGO_PKG_VERSION"),
        server: SERVER_NAME,
    })
}
