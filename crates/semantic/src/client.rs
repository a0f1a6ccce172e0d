use std::sync::Arc;

use chrono::Utc;

use crate::extractor::build_extractor;
use crate::normalize::{l2_norm, l2_normalize_in_place};
use crate::{EmbeddingConfig, EmbeddingMetadata, FeatureExtraction, FeatureExtractor, SemanticError};

/// Adapter around a single inference call: input validation, dimension guard, normalization.
pub struct EmbeddingClient {
    extractor: Arc<dyn FeatureExtractor>,
    model: String,
    expected_dimension: Option<usize>,
    normalize: bool,
}

impl EmbeddingClient {
    /// Wrap an existing extractor with the post-processing rules from `cfg`.
    pub fn new(extractor: Arc<dyn FeatureExtractor>, cfg: &EmbeddingConfig) -> Self {
        Self {
            extractor,
            model: cfg.model.clone(),
            expected_dimension: cfg.expected_dimension,
            normalize: cfg.normalize,
        }
    }

    /// Build the extractor selected by `cfg` and wrap it.
    pub fn from_config(cfg: &EmbeddingConfig) -> Result<Self, SemanticError> {
        Ok(Self::new(build_extractor(cfg)?, cfg))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn expected_dimension(&self) -> Option<usize> {
        self.expected_dimension
    }

    /// Reject text that is empty after trimming.
    pub fn validate_text(text: &str) -> Result<(), SemanticError> {
        if text.trim().is_empty() {
            return Err(SemanticError::Validation(
                "text must be a non-empty string".into(),
            ));
        }
        Ok(())
    }

    /// Turn `text` into a vector with one inference call. `model` overrides the configured default.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()), err(Display))]
    pub async fn extract_features(
        &self,
        text: &str,
        model: Option<&str>,
    ) -> Result<FeatureExtraction, SemanticError> {
        Self::validate_text(text)?;

        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.model);
        let mut embeddings = self.extractor.extract(text, model).await?;

        if let Some(expected) = self.expected_dimension {
            if embeddings.len() != expected {
                tracing::error!(
                    expected,
                    actual = embeddings.len(),
                    model,
                    "embedding dimension does not match configuration"
                );
                return Err(SemanticError::DimensionMismatch {
                    expected,
                    actual: embeddings.len(),
                });
            }
        }

        let magnitude = l2_norm(&embeddings);
        if self.normalize {
            l2_normalize_in_place(&mut embeddings);
        }

        tracing::debug!(model, dimensions = embeddings.len(), "features extracted");

        Ok(FeatureExtraction {
            metadata: EmbeddingMetadata {
                dimensions: embeddings.len(),
                magnitude,
                normalized: self.normalize,
            },
            embeddings,
            model: model.to_string(),
            timestamp: Utc::now(),
        })
    }
}
