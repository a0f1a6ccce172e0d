use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docsearch::SearchError;
use index::IndexError;
use semantic::SemanticError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A required service was not configured at startup.
    #[error("{0} is not initialized; check the server's embedding and vector store configuration")]
    NotInitialized(&'static str),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    /// Stable machine-readable code.
    pub error: String,
    /// RFC 3339.
    pub timestamp: String,
    /// Request path. Filled in by [`crate::middleware::error_path`].
    pub path: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Search(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            ServerError::Semantic(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            ServerError::Index(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            ServerError::Search(_)
            | ServerError::Semantic(_)
            | ServerError::Index(_)
            | ServerError::NotInitialized(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::NotInitialized(_) => "NOT_INITIALIZED",
            ServerError::Search(SearchError::Validation(_)) => "VALIDATION_ERROR",
            ServerError::Search(SearchError::Semantic(err)) => semantic_code(err),
            ServerError::Search(SearchError::Index(err)) => index_code(err),
            ServerError::Semantic(err) => semantic_code(err),
            ServerError::Index(err) => index_code(err),
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    fn to_body(&self) -> ErrorResponse {
        ErrorResponse {
            status_code: self.status_code().as_u16(),
            message: self.to_string(),
            error: self.error_code().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            path: String::new(),
        }
    }
}

fn semantic_code(err: &SemanticError) -> &'static str {
    match err {
        SemanticError::Validation(_) => "VALIDATION_ERROR",
        SemanticError::BatchSize { .. } => "BATCH_SIZE_ERROR",
        SemanticError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
        SemanticError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
        SemanticError::InvalidResponse(_) => "INVALID_RESPONSE",
        SemanticError::InvalidConfig(_) => "CONFIG_ERROR",
    }
}

fn index_code(err: &IndexError) -> &'static str {
    match err {
        IndexError::Validation(_) => "VALIDATION_ERROR",
        IndexError::BatchSize { .. } => "BATCH_SIZE_ERROR",
        IndexError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
        IndexError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
        IndexError::InvalidResponse(_) => "INVALID_RESPONSE",
        IndexError::InvalidConfig(_) => "CONFIG_ERROR",
        IndexError::Backend(_) => "INDEX_BACKEND_ERROR",
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "request rejected");
        }

        let body = self.to_body();
        let mut response = (status, Json(&body)).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(rejection.body_text())
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = ServerError::Search(SearchError::Validation("query must be a non-empty string".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = ServerError::Index(IndexError::BatchSize {
            operation: "upsert",
            limit: 1000,
            actual: 1001,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BATCH_SIZE_ERROR");
    }

    #[test]
    fn upstream_failures_are_server_errors() {
        let err = ServerError::Search(SearchError::Semantic(SemanticError::ExternalService(
            "HTTP error 401 Unauthorized: Invalid credentials".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");
        assert!(err.to_string().contains("Invalid credentials"));

        let err = ServerError::Semantic(SemanticError::DimensionMismatch {
            expected: 1024,
            actual: 768,
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "DIMENSION_MISMATCH");

        let err = ServerError::NotInitialized("vector index");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "NOT_INITIALIZED");
    }

    #[test]
    fn response_carries_envelope_extension() {
        let response = ServerError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response.extensions().get::<ErrorResponse>().unwrap();
        assert_eq!(body.status_code, 404);
        assert_eq!(body.error, "NOT_FOUND");
        assert!(chrono::DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
    }
}
