use thiserror::Error;

/// Errors surfaced by the vector index adapter and its backends.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndexError {
    /// Caller input is malformed. Raised before any call to the store.
    #[error("validation error: {0}")]
    Validation(String),
    /// A batch exceeds the ceiling for `operation`.
    #[error("batch size error: {operation} accepts at most {limit} items, got {actual}")]
    BatchSize {
        operation: &'static str,
        limit: usize,
        actual: usize,
    },
    /// A vector does not match the index dimension.
    #[error("dimension mismatch for vector '{id}': expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
    /// The managed vector database rejected or failed the call. Upstream message kept verbatim.
    #[error("vector store request failed: {0}")]
    ExternalService(String),
    /// The store answered with a payload we could not decode.
    #[error("invalid vector store response: {0}")]
    InvalidResponse(String),
    /// Configuration is incomplete (missing API key, index name, host).
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    /// Local backend failure (poisoned lock and the like).
    #[error("backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` for errors caused by caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IndexError::Validation(_)
                | IndexError::BatchSize { .. }
                | IndexError::DimensionMismatch { .. }
        )
    }
}
