use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationFailed = 1001,

    // Resource errors (2xxx)
    NotFound = 2001,

    // Document store errors (3xxx)
    DatabaseQuery = 3001,

    // External service errors (5xxx)
    EmbeddingServiceError = 5001,
    LlmServiceError = 5002,
    IndexWriteError = 5003,
    ExternalSearchError = 5004,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Application error taxonomy.
///
/// `IndexWrite` and `ExternalSearch` are caught inside the services that
/// produce them (best-effort indexing and paper search respectively); they
/// only turn into responses if a bug lets them escape.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Resource not found: {resource_type} with id {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    #[error("Database query error: {0}")]
    DatabaseQueryError(#[from] sea_orm::DbErr),

    #[error("Embedding service error: {0}")]
    EmbeddingServiceError(String),

    #[error("LLM service error: {0}")]
    LlmServiceError(String),

    #[error("Vector index write failed: {0}")]
    IndexWriteError(String),

    #[error("External search error: {0}")]
    ExternalSearchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ValidationError(_) => ErrorCode::ValidationFailed,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::DatabaseQueryError(_) => ErrorCode::DatabaseQuery,
            Self::EmbeddingServiceError(_) => ErrorCode::EmbeddingServiceError,
            Self::LlmServiceError(_) => ErrorCode::LlmServiceError,
            Self::IndexWriteError(_) => ErrorCode::IndexWriteError,
            Self::ExternalSearchError(_) => ErrorCode::ExternalSearchError,
            Self::ConfigError(_) | Self::Configuration(_) => ErrorCode::ConfigurationError,
            Self::InternalError(_) => ErrorCode::InternalError,
        }
    }

    /// What the client is allowed to see. Validation and not-found messages
    /// are safe to echo; everything else gets a fixed per-code message with
    /// the real detail confined to the server-side log.
    pub fn public_message(&self) -> String {
        match self {
            Self::ValidationError(_) | Self::NotFound { .. } => self.to_string(),
            Self::DatabaseQueryError(_) => "A storage error occurred".to_string(),
            Self::EmbeddingServiceError(_) => {
                "The embedding service is currently unavailable".to_string()
            }
            Self::LlmServiceError(_) => {
                "The language model service is currently unavailable".to_string()
            }
            Self::IndexWriteError(_) => "The search index could not be updated".to_string(),
            Self::ExternalSearchError(_) => {
                "External paper search is currently unavailable".to_string()
            }
            Self::ConfigError(_) | Self::Configuration(_) => {
                "The service is misconfigured".to_string()
            }
            Self::InternalError(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DatabaseQueryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::EmbeddingServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::LlmServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::IndexWriteError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalSearchError(_) => StatusCode::BAD_GATEWAY,
            Self::ConfigError(_) | Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.public_message();

        // Log based on severity; expected client errors stay at debug. The
        // full error text goes to the log only, never the response body.
        match &self {
            AppError::ValidationError(_) | AppError::NotFound { .. } => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            _ => {
                let detail = self.to_string();
                tracing::error!(error_code = error_code.as_u16(), %detail, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
                "details": if cfg!(debug_assertions) {
                    Some(format!("{:?}", self))
                } else {
                    None
                }
            }
        }));

        (status, body).into_response()
    }
}

/// Mask any `key=...` query value so credentialed URLs can appear in error
/// text without leaking the credential.
pub(crate) fn redact_api_key(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find("key=") {
        let value_start = pos + "key=".len();
        out.push_str(&rest[..value_start]);
        let tail = &rest[value_start..];
        let value_end = tail
            .find(|c: char| c == '&' || c == ')' || c == '"' || c.is_whitespace())
            .unwrap_or(tail.len());
        out.push_str("REDACTED");
        rest = &tail[value_end..];
    }
    out.push_str(rest);
    out
}

/// Helper macro for creating NotFound errors
#[macro_export]
macro_rules! not_found {
    ($resource_type:expr, $resource_id:expr) => {
        $crate::errors::AppError::NotFound {
            resource_type: $resource_type.to_string(),
            resource_id: $resource_id.to_string(),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = not_found!("post", "abc");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code().as_u16(), 2001);
    }

    #[test]
    fn test_external_service_errors_are_bad_gateway() {
        let err = AppError::EmbeddingServiceError("timeout".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        let err = AppError::LlmServiceError("upstream 500".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_redact_api_key() {
        let raw = "error sending request for url (https://api.example/v1:embedContent?key=sk-secret-123)";
        let redacted = redact_api_key(raw);
        assert!(!redacted.contains("sk-secret-123"));
        assert!(redacted.contains("key=REDACTED)"));

        let multi = redact_api_key("a?key=one&b=2 then ?key=two done");
        assert!(!multi.contains("one"));
        assert!(!multi.contains("two"));
        assert_eq!(redact_api_key("no credentials here"), "no credentials here");
    }

    #[test]
    fn test_server_error_message_is_generic() {
        let err = AppError::EmbeddingServiceError(
            "request failed: url (https://api.example?key=sk-secret)".into(),
        );
        let public = err.public_message();
        assert_eq!(public, "The embedding service is currently unavailable");
        assert!(!public.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_response_body_hides_internal_detail() {
        let err = AppError::LlmServiceError("upstream said: quota exhausted for key abc".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["error"]["message"],
            "The language model service is currently unavailable"
        );
    }

    #[test]
    fn test_client_error_message_preserved() {
        let err = AppError::ValidationError("title must not be empty".into());
        assert_eq!(
            err.public_message(),
            "Validation failed: title must not be empty"
        );
    }
}
