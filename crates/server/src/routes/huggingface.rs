use crate::error::ServerResult;
use crate::routes::ApiJson;
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use semantic::{EmbeddingClient, EmbeddingMetadata};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ExtractFeaturesRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Overrides the configured model for this call.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractFeaturesResponse {
    pub embeddings: Vec<f32>,
    pub model: String,
    pub input_text: String,
    pub embedding_metadata: EmbeddingMetadata,
    pub timestamp: DateTime<Utc>,
}

/// Raw feature extraction. The text is sent as-is, without a role prefix.
pub async fn extract_features(
    State(state): State<Arc<ServerState>>,
    ApiJson(request): ApiJson<ExtractFeaturesRequest>,
) -> ServerResult<impl IntoResponse> {
    let text = request.text.unwrap_or_default();
    EmbeddingClient::validate_text(&text)?;
    let model = request.model.as_deref().filter(|m| !m.trim().is_empty());

    let extraction = state
        .embeddings()?
        .client()
        .extract_features(&text, model)
        .await?;
    Ok(Json(ExtractFeaturesResponse {
        embeddings: extraction.embeddings,
        model: extraction.model,
        input_text: text,
        embedding_metadata: extraction.metadata,
        timestamp: extraction.timestamp,
    }))
}
