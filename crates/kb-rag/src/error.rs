//! Error types for the knowledge-base service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for knowledge-base operations
pub type Result<T> = std::result::Result<T, Error>;

/// Knowledge-base service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Document format not accepted by the extractor
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Invalid byte sequence in a plain-text document
    #[error("Failed to decode '{source_label}' as UTF-8: {message}")]
    Decode {
        source_label: String,
        message: String,
    },

    /// Configuration error (chunker misconfiguration, bad address, bad regex)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text extraction failed (PDF parser error, empty document)
    #[error("Failed to extract text from '{source_label}': {message}")]
    Extraction {
        source_label: String,
        message: String,
    },

    /// Embedding provider returned a vector of the wrong length
    #[error("Embedding dimension mismatch: got {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    /// Embedding backend unreachable or failing
    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Inference backend unreachable or failing
    #[error("Inference service unavailable: {0}")]
    InferenceUnavailable(String),

    /// A single URL could not be fetched (non-fatal to a batch)
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Vector store error
    #[error("Vector store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(source_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            source_label: source_label.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(source_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            source_label: source_label.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error for a single URL
    pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a vector store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_format"),
            Error::Decode { .. } => (StatusCode::BAD_REQUEST, "decode_error"),
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Extraction { .. } => (StatusCode::BAD_REQUEST, "extraction_error"),
            Error::DimensionMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "dimension_mismatch")
            }
            Error::EmbeddingUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable")
            }
            Error::InferenceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "inference_unavailable")
            }
            Error::FetchFailed { .. } => (StatusCode::BAD_GATEWAY, "fetch_failed"),
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
