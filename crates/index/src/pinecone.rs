use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    IndexDescription, IndexError, IndexStats, Namespace, QueryRequest, ScoredVector, VectorRecord,
    VectorStore,
};

pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_API_VERSION: &str = "2024-07";

/// Connection settings for a managed Pinecone index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PineconeConfig {
    pub api_key: Option<String>,
    pub index_name: Option<String>,
    /// Data-plane host. Resolved from the control plane when absent.
    pub host: Option<String>,
    pub controller_url: String,
    pub api_version: String,
    pub timeout_secs: u64,
    /// Dimension enforced on upsert. `None` disables the check.
    pub dimension: Option<usize>,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: None,
            host: None,
            controller_url: DEFAULT_CONTROLLER_URL.into(),
            api_version: DEFAULT_API_VERSION.into(),
            timeout_secs: 30,
            dimension: None,
        }
    }
}

impl PineconeConfig {
    /// Both the API key and the index name are present and non-blank.
    pub fn is_configured(&self) -> bool {
        non_blank(&self.api_key).is_some() && non_blank(&self.index_name).is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// REST client for one Pinecone index.
pub struct PineconeStore {
    http: reqwest::Client,
    api_key: String,
    api_version: String,
    index_name: String,
    controller_url: String,
    host: String,
    dimension: Option<usize>,
}

impl PineconeStore {
    /// Build a store, asking the control plane for the data-plane host when none is configured.
    ///
    /// The index dimension comes from `cfg.dimension`, or else from the control plane.
    pub async fn connect(cfg: &PineconeConfig) -> Result<Self, IndexError> {
        let mut store = Self::unresolved(cfg)?;
        match non_blank(&cfg.host) {
            Some(host) => {
                store.host = with_scheme(host);
                if store.dimension.is_none() {
                    match store.describe_index().await {
                        Ok(description) => store.dimension = description.dimension,
                        Err(error) => tracing::warn!(
                            index = %store.index_name,
                            %error,
                            "could not read index dimension; upsert dimension check disabled"
                        ),
                    }
                }
            }
            None => {
                let description = store.describe_index().await?;
                let host = description.host.ok_or_else(|| {
                    IndexError::InvalidResponse(format!(
                        "index '{}' has no host yet",
                        store.index_name
                    ))
                })?;
                store.host = with_scheme(&host);
                store.dimension = store.dimension.or(description.dimension);
            }
        }
        tracing::info!(
            index = %store.index_name,
            host = %store.host,
            dimension = ?store.dimension,
            "pinecone store ready"
        );
        Ok(store)
    }

    /// Build a store against a known data-plane host without contacting the control plane.
    pub fn with_host(cfg: &PineconeConfig, host: &str) -> Result<Self, IndexError> {
        let mut store = Self::unresolved(cfg)?;
        store.host = with_scheme(host);
        Ok(store)
    }

    fn unresolved(cfg: &PineconeConfig) -> Result<Self, IndexError> {
        let api_key = non_blank(&cfg.api_key)
            .ok_or_else(|| IndexError::InvalidConfig("PINECONE_API_KEY is not set".into()))?;
        let index_name = non_blank(&cfg.index_name)
            .ok_or_else(|| IndexError::InvalidConfig("PINECONE_INDEX_NAME is not set".into()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IndexError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_version: cfg.api_version.clone(),
            index_name: index_name.to_string(),
            controller_url: cfg.controller_url.trim_end_matches('/').to_string(),
            host: String::new(),
            dimension: cfg.dimension,
        })
    }

    fn data_url(&self, path: &str) -> String {
        format!("{}{path}", self.host)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, IndexError> {
        let response = builder
            .send()
            .await
            .map_err(|e| IndexError::ExternalService(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::ExternalService(format!(
                "HTTP error {status}: {}",
                upstream_message(&body)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IndexError::InvalidResponse(format!("failed to read body: {e}")))?;
        // Delete answers with an empty body.
        let body = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(body)
            .map_err(|e| IndexError::InvalidResponse(format!("invalid JSON response: {e}")))
    }
}

fn with_scheme(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Prefer Pinecone's `{"message": "..."}` (or `{"error": {"message": ...}}`) over the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| value.pointer("/error/message").and_then(Value::as_str))
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, VectorRecord>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    index_fullness: f64,
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: u64,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    name: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Deserialize, Default)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn upsert(
        &self,
        namespace: &Namespace,
        records: Vec<VectorRecord>,
    ) -> Result<usize, IndexError> {
        let body = json!({ "vectors": records, "namespace": namespace.as_wire() });
        let response: UpsertResponse = self
            .send(
                self.request(reqwest::Method::POST, &self.data_url("/vectors/upsert"))
                    .json(&body),
            )
            .await?;
        Ok(response.upserted_count)
    }

    async fn fetch(
        &self,
        namespace: &Namespace,
        ids: &[String],
    ) -> Result<Vec<VectorRecord>, IndexError> {
        let mut params: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        params.push(("namespace", namespace.as_wire()));

        let mut response: FetchResponse = self
            .send(
                self.request(reqwest::Method::GET, &self.data_url("/vectors/fetch"))
                    .query(&params),
            )
            .await?;
        Ok(ids
            .iter()
            .filter_map(|id| response.vectors.remove(id))
            .collect())
    }

    async fn delete(&self, namespace: &Namespace, ids: &[String]) -> Result<(), IndexError> {
        let body = json!({ "ids": ids, "namespace": namespace.as_wire() });
        let _: Value = self
            .send(
                self.request(reqwest::Method::POST, &self.data_url("/vectors/delete"))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        request: &QueryRequest,
    ) -> Result<Vec<ScoredVector>, IndexError> {
        let mut body = json!({
            "vector": request.vector,
            "topK": request.top_k,
            "includeMetadata": request.include_metadata,
            "includeValues": request.include_values,
            "namespace": namespace.as_wire(),
        });
        if let Some(filter) = &request.filter {
            body["filter"] = filter.clone();
        }
        let response: QueryResponse = self
            .send(
                self.request(reqwest::Method::POST, &self.data_url("/query"))
                    .json(&body),
            )
            .await?;
        Ok(response.matches)
    }

    async fn describe_stats(&self) -> Result<IndexStats, IndexError> {
        let response: StatsResponse = self
            .send(
                self.request(reqwest::Method::POST, &self.data_url("/describe_index_stats"))
                    .json(&json!({})),
            )
            .await?;
        let namespaces = response
            .namespaces
            .into_iter()
            .map(|(name, stats)| (Namespace::new(name).label().to_string(), stats.vector_count))
            .collect();
        Ok(IndexStats {
            dimension: response.dimension,
            index_fullness: response.index_fullness,
            total_record_count: response.total_vector_count,
            namespaces,
        })
    }

    async fn describe_index(&self) -> Result<IndexDescription, IndexError> {
        let url = format!("{}/indexes/{}", self.controller_url, self.index_name);
        let response: DescribeIndexResponse =
            self.send(self.request(reqwest::Method::GET, &url)).await?;
        Ok(IndexDescription {
            name: response.name,
            dimension: response.dimension,
            host: response.host,
            ready: response.status.ready,
            state: response.status.state,
        })
    }
}
