use crate::error::{ServerError, ServerResult};
use crate::routes::ApiJson;
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use docsearch::{SearchMatch, SearchOptions, StoreTextRequest, DEFAULT_TOP_K};
use index::{ConnectionStatus, Metadata, Namespace, NamespaceSummary, VectorIndex, VectorRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Signed so that negative values reach validation instead of failing to parse.
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub matches: Vec<SearchMatch>,
    pub query: String,
    pub match_count: usize,
}

/// Semantic search over stored passages
pub async fn search(
    State(state): State<Arc<ServerState>>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> ServerResult<impl IntoResponse> {
    let query = request.query.unwrap_or_default();
    let top_k = match request.top_k {
        None => DEFAULT_TOP_K,
        Some(k) => usize::try_from(k).unwrap_or(0),
    };
    let mut options = SearchOptions::new(query.clone())
        .with_top_k(top_k)
        .with_namespace(Namespace::from(request.namespace));
    if let Some(filter) = request.filter {
        options = options.with_filter(filter);
    }
    options.validate()?;

    let matches = state.search()?.vector_search(options).await?;
    Ok(Json(SearchResponse {
        match_count: matches.len(),
        matches,
        query,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StoreTextBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Embed one text as a passage and store it
pub async fn store_text(
    State(state): State<Arc<ServerState>>,
    ApiJson(body): ApiJson<StoreTextBody>,
) -> ServerResult<impl IntoResponse> {
    let request = StoreTextRequest {
        text: body.text.unwrap_or_default(),
        id: body.id,
        metadata: body.metadata,
        namespace: Namespace::from(body.namespace),
    };
    request.validate()?;

    let stored = state.search()?.store_text(request).await?;
    Ok(Json(stored))
}

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub vectors: Vec<Vec<f32>>,
    #[serde(default)]
    pub metadata: Option<Vec<Metadata>>,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Upsert caller-supplied vectors
pub async fn upsert(
    State(state): State<Arc<ServerState>>,
    ApiJson(body): ApiJson<UpsertBody>,
) -> ServerResult<impl IntoResponse> {
    VectorIndex::check_chunks(&body.ids, &body.vectors, body.metadata.as_deref())?;

    let summary = state
        .index()?
        .upsert_chunks(
            body.ids,
            body.vectors,
            body.metadata,
            &Namespace::from(body.namespace),
        )
        .await?;
    Ok(Json(serde_json::json!({
        "message": format!("{} vectors upserted", summary.upserted_count),
        "upsertedCount": summary.upserted_count,
        "namespace": summary.namespace,
    })))
}

#[derive(Debug, Deserialize)]
pub struct FetchBody {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub vectors: Vec<VectorRecord>,
    pub count: usize,
}

/// Fetch stored vectors by id
pub async fn fetch(
    State(state): State<Arc<ServerState>>,
    ApiJson(body): ApiJson<FetchBody>,
) -> ServerResult<impl IntoResponse> {
    VectorIndex::check_fetch_ids(&body.ids)?;

    let vectors = state
        .index()?
        .fetch_vectors(&body.ids, &Namespace::from(body.namespace))
        .await?;
    Ok(Json(FetchResponse {
        count: vectors.len(),
        vectors,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    /// Comma-separated ids
    #[serde(default)]
    pub ids: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Delete vectors by id
pub async fn delete_vectors(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<DeleteParams>,
) -> ServerResult<impl IntoResponse> {
    let ids: Vec<String> = params
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(ServerError::BadRequest(
            "ids query parameter is required (comma-separated)".to_string(),
        ));
    }

    let deleted = state
        .index()?
        .delete_vectors(&ids, &Namespace::from(params.namespace))
        .await?;
    Ok(Json(serde_json::json!({
        "deletedCount": deleted,
        "message": format!("{deleted} vectors deleted"),
    })))
}

/// Index-wide statistics
pub async fn index_stats(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let stats = state.admin()?.get_index_stats().await?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<NamespaceSummary>,
    pub count: usize,
}

/// List namespaces with their record counts
pub async fn namespaces(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let namespaces = state.admin()?.list_namespaces().await?;
    Ok(Json(NamespacesResponse {
        count: namespaces.len(),
        namespaces,
    }))
}

/// Vector store connectivity. Always 200; failures are described in the body.
pub async fn health(State(state): State<Arc<ServerState>>) -> Json<ConnectionStatus> {
    let status = match state.admin() {
        Ok(admin) => admin.verify_connection().await,
        Err(_) => ConnectionStatus::not_initialized(),
    };
    Json(status)
}
