use index::IndexError;
use semantic::SemanticError;
use thiserror::Error;

/// Errors returned by [`SemanticSearchService`](crate::SemanticSearchService).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// Search options rejected before any external call.
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl SearchError {
    /// `true` when the caller can fix the request.
    ///
    /// Vectors reaching the index from here come from the embedding model, so a dimension
    /// mismatch is configuration drift on the server side.
    pub fn is_validation(&self) -> bool {
        match self {
            SearchError::Validation(_) => true,
            SearchError::Semantic(err) => err.is_validation(),
            SearchError::Index(IndexError::DimensionMismatch { .. }) => false,
            SearchError::Index(err) => err.is_validation(),
        }
    }
}
