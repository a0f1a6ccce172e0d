use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "docsearch-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

fn component(ready: bool) -> &'static str {
    if ready {
        "ready"
    } else {
        "not_initialized"
    }
}

/// Readiness check endpoint
///
/// 200 when both the embedding client and the vector index are available, 503 otherwise.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let embeddings = state.embeddings.is_some();
    let index = state.index.is_some();
    let ready = embeddings && index;

    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "docsearch-server",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": uptime_seconds(),
            "components": {
                "api": "ready",
                "embeddings": component(embeddings),
                "index": component(index),
            }
        })),
    )
}
