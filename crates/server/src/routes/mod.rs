//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `pinecone`: semantic search, vector CRUD and index diagnostics
//! - `huggingface`: raw feature extraction

pub mod health;
pub mod huggingface;
pub mod pinecone;

use crate::error::{ServerError, ServerResult};
use axum::extract::FromRequest;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// `Json` extractor whose rejections use the server's error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// API version and base info
///
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "docsearch",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /pinecone/search",
            "POST /pinecone/store-text",
            "POST /pinecone/upsert",
            "POST /pinecone/fetch",
            "DELETE /pinecone/vectors",
            "GET /pinecone/index/stats",
            "GET /pinecone/namespaces",
            "GET /pinecone/health",
            "POST /huggingface/extract-features",
            "GET /health",
            "GET /ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
