use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::normalize::mean_pool;
use crate::{EmbeddingConfig, FeatureExtractor, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

fn api_provider_kind(cfg: &EmbeddingConfig) -> ApiProviderKind {
    let provider = cfg
        .api_provider
        .as_deref()
        .unwrap_or("hf")
        .to_ascii_lowercase();
    match provider.as_str() {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" | "gpt" => ApiProviderKind::OpenAI,
        _ => ApiProviderKind::Custom,
    }
}

/// Feature extraction over HTTP (Hugging Face inference, OpenAI-compatible, or a custom endpoint).
///
/// Owns its own connection pool; build it once and share it behind an `Arc`.
pub struct HttpFeatureExtractor {
    http: reqwest::Client,
    cfg: EmbeddingConfig,
    provider: ApiProviderKind,
    auth_header: String,
}

impl HttpFeatureExtractor {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, SemanticError> {
        let token = cfg
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                SemanticError::InvalidConfig("api_token is required for api mode".into())
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            provider: api_provider_kind(cfg),
            auth_header: format!("Bearer {token}"),
            cfg: cfg.clone(),
        })
    }

    fn build_payload(&self, text: &str, model: &str) -> Value {
        match self.provider {
            ApiProviderKind::HuggingFace => json!({ "inputs": text }),
            ApiProviderKind::OpenAI => json!({ "input": text, "model": model }),
            ApiProviderKind::Custom => json!({ "text": text, "model": model }),
        }
    }

    async fn send(&self, url: &str, payload: Value) -> Result<Value, SemanticError> {
        let response = self
            .http
            .post(url)
            .header("Authorization", &self.auth_header)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SemanticError::ExternalService(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::ExternalService(format!(
                "HTTP error {status}: {}",
                upstream_message(&body)
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::InvalidResponse(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl FeatureExtractor for HttpFeatureExtractor {
    async fn extract(&self, text: &str, model: &str) -> Result<Vec<f32>, SemanticError> {
        let url = self.cfg.endpoint_for(model);
        let payload = self.build_payload(text, model);
        let response = self.send(&url, payload).await?;
        collapse_to_vector(response)
    }
}

/// Prefer the provider's `{"error": "..."}` message over the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("error") {
            Some(Value::String(msg)) => Some(msg.clone()),
            Some(Value::Object(obj)) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            _ => None,
        })
        .unwrap_or_else(|| body.to_string())
}

/// Reduce an inference response to one sentence vector. Token-level output is mean-pooled.
fn collapse_to_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    let mut rows = parse_embeddings_from_value(value)?;
    match rows.len() {
        0 => Err(SemanticError::InvalidResponse(
            "response did not contain embeddings".into(),
        )),
        1 => Ok(rows.pop().unwrap_or_default()),
        _ => mean_pool(&rows).ok_or_else(|| {
            SemanticError::InvalidResponse("token embeddings have inconsistent widths".into())
        }),
    }
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => {
                            if let Some(embedding) = obj.remove("embedding") {
                                vectors.push(parse_embedding_vector(embedding)?);
                            } else {
                                return Err(SemanticError::InvalidResponse(
                                    "missing `embedding` field in data item".into(),
                                ));
                            }
                        }
                        _ => {
                            return Err(SemanticError::InvalidResponse(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            Err(SemanticError::InvalidResponse(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(mut items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.len() == 1 && is_matrix(&items[0]) {
                // [[[...]]]: a batch of one token matrix
                parse_embedding_collection(items.remove(0))
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn is_matrix(value: &Value) -> bool {
    matches!(value, Value::Array(rows) if rows.first().is_some_and(Value::is_array))
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num.as_f64().map(|f| f as f32).ok_or_else(|| {
                    SemanticError::InvalidResponse("non-finite embedding value".into())
                }),
                other => Err(SemanticError::InvalidResponse(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::InvalidResponse(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
