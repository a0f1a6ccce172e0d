use async_trait::async_trait;
use fxhash::hash64;

use crate::{FeatureExtractor, SemanticError};

/// Deterministic stub used for local development and tests.
/// Generates sinusoid values derived from a hash of the input text to guarantee reproducible
/// vectors with minimal CPU cost. Not semantically meaningful.
#[derive(Debug, Clone)]
pub struct StubFeatureExtractor {
    dimension: usize,
}

impl StubFeatureExtractor {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl FeatureExtractor for StubFeatureExtractor {
    async fn extract(&self, text: &str, model: &str) -> Result<Vec<f32>, SemanticError> {
        let h = hash64(text.as_bytes()) ^ hash64(model.as_bytes()).rotate_left(17);
        let vector = (0..self.dimension)
            .map(|idx| ((h >> (idx % 32)) as f32 * 0.0001 + idx as f32).sin())
            .collect();
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_has_configured_dimension() {
        let stub = StubFeatureExtractor::new(384);
        let v = stub.extract("hello world", "m").await.unwrap();
        assert_eq!(v.len(), 384);
    }

    #[tokio::test]
    async fn stub_is_deterministic() {
        let stub = StubFeatureExtractor::new(64);
        let a = stub.extract("same text", "m").await.unwrap();
        let b = stub.extract("same text", "m").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn stub_differs_by_text() {
        let stub = StubFeatureExtractor::new(64);
        let a = stub.extract("query: hello", "m").await.unwrap();
        let b = stub.extract("passage: hello", "m").await.unwrap();
        assert_ne!(a, b);
    }
}
