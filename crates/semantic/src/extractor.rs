use std::sync::Arc;

use async_trait::async_trait;

use crate::api::HttpFeatureExtractor;
use crate::stub::StubFeatureExtractor;
use crate::{EmbeddingConfig, ExtractorMode, SemanticError};

/// One text in, one raw vector out. Implementations perform exactly one
/// inference call per invocation and never retry.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// Produce the raw (un-normalized) vector for `text` using `model`.
    async fn extract(&self, text: &str, model: &str) -> Result<Vec<f32>, SemanticError>;
}

/// Build the extractor selected by `cfg.mode`.
pub fn build_extractor(cfg: &EmbeddingConfig) -> Result<Arc<dyn FeatureExtractor>, SemanticError> {
    match cfg.mode {
        ExtractorMode::Api => Ok(Arc::new(HttpFeatureExtractor::new(cfg)?)),
        ExtractorMode::Stub => Ok(Arc::new(StubFeatureExtractor::new(cfg.stub_len()))),
    }
}
