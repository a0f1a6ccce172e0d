use thiserror::Error;

/// Errors surfaced by the embedding client and the orchestration service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    /// Caller input is malformed (empty text, blank batch item, ...).
    #[error("validation error: {0}")]
    Validation(String),
    /// A batch is empty or exceeds the configured ceiling.
    #[error("batch size error: got {actual} items, expected between 1 and {limit}")]
    BatchSize { limit: usize, actual: usize },
    /// The inference endpoint returned a vector of an unexpected length.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The inference endpoint failed (network, auth, rate limit, server error).
    /// The upstream message is kept verbatim.
    #[error("inference request failed: {0}")]
    ExternalService(String),
    /// The endpoint answered, but not with something that looks like an embedding.
    #[error("invalid inference response: {0}")]
    InvalidResponse(String),
    /// Configuration is inconsistent (missing token for api mode, bad URL, ...).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
}

impl SemanticError {
    /// `true` for errors caused by caller input rather than by the provider or configuration.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SemanticError::Validation(_) | SemanticError::BatchSize { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_validation() {
        let err = SemanticError::Validation("text must be a non-empty string".into());
        assert!(err.to_string().contains("validation error"));
        assert!(err.to_string().contains("non-empty"));
        assert!(err.is_validation());
    }

    #[test]
    fn error_batch_size_reports_limit() {
        let err = SemanticError::BatchSize {
            limit: 100,
            actual: 101,
        };
        assert!(err.to_string().contains("101"));
        assert!(err.to_string().contains("100"));
        assert!(err.is_validation());
    }

    #[test]
    fn error_dimension_mismatch_reports_both_values() {
        let err = SemanticError::DimensionMismatch {
            expected: 1024,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("1024"));
        assert!(msg.contains("768"));
        assert!(!err.is_validation());
    }

    #[test]
    fn error_external_keeps_upstream_message() {
        let err = SemanticError::ExternalService("HTTP 401: invalid token".into());
        assert!(err.to_string().contains("HTTP 401: invalid token"));
        assert!(!err.is_validation());
    }
}
