use serde::{Deserialize, Serialize};

/// Default retrieval model. The e5 family is trained with `"query: "` / `"passage: "` prefixes.
pub const DEFAULT_MODEL: &str = "intfloat/multilingual-e5-large";

/// Hugging Face router template; `{model}` is replaced by the model id.
pub const DEFAULT_API_URL: &str =
    "https://router.huggingface.co/hf-inference/models/{model}/pipeline/feature-extraction";

/// Which [`FeatureExtractor`](crate::FeatureExtractor) backs the embedding client.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorMode {
    /// Remote HTTP inference endpoint.
    #[default]
    Api,
    /// Deterministic hash-derived vectors. No network, for local development and tests.
    Stub,
}

/// Runtime configuration for the embedding client.
///
/// # Example
/// ```
/// use semantic::{EmbeddingConfig, ExtractorMode};
///
/// let cfg = EmbeddingConfig {
///     mode: ExtractorMode::Api,
///     api_token: Some("hf_xxx".into()),
///     expected_dimension: Some(1024),
///     ..Default::default()
/// };
/// assert_eq!(
///     cfg.endpoint_for("intfloat/multilingual-e5-large"),
///     "https://router.huggingface.co/hf-inference/models/intfloat/multilingual-e5-large/pipeline/feature-extraction"
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend selector.
    pub mode: ExtractorMode,
    /// Inference endpoint. May contain a `{model}` placeholder.
    pub api_url: Option<String>,
    /// Bearer token for the inference provider.
    pub api_token: Option<String>,
    /// Remote provider hint: `"hf"` (default), `"openai"`, or `"custom"`.
    pub api_provider: Option<String>,
    /// Model used when a caller does not name one.
    pub model: String,
    /// When set, every returned vector must have exactly this many components.
    pub expected_dimension: Option<usize>,
    /// L2-normalize returned vectors.
    pub normalize: bool,
    /// Overall HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// How many passages `embed_passages` embeds at once. `1` is strictly sequential.
    pub batch_concurrency: usize,
    /// Vector length produced by the stub backend when no expected dimension is set.
    pub stub_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Api,
            api_url: None,
            api_token: None,
            api_provider: None,
            model: DEFAULT_MODEL.into(),
            expected_dimension: None,
            normalize: true,
            timeout_secs: 30,
            batch_concurrency: 1,
            stub_dimension: 1024,
        }
    }
}

impl EmbeddingConfig {
    /// Resolve the endpoint URL for `model`.
    pub fn endpoint_for(&self, model: &str) -> String {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .replace("{model}", model)
    }

    /// `true` when the configuration is complete enough to build a client.
    pub fn is_configured(&self) -> bool {
        match self.mode {
            ExtractorMode::Stub => true,
            ExtractorMode::Api => self
                .api_token
                .as_deref()
                .is_some_and(|token| !token.trim().is_empty()),
        }
    }

    /// Length of vectors the stub backend produces.
    pub(crate) fn stub_len(&self) -> usize {
        self.expected_dimension.unwrap_or(self.stub_dimension)
    }
}
