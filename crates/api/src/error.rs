//! API Error Types

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use storage::StorageError;
use thiserror::Error;
use tracing::warn;

use crate::params::ParamsError;

pub(crate) const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Errors that end a request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{a} + {b} overflows a 64-bit integer")]
    Overflow { a: i64, b: i64 },

    #[error("malformed query string: {0}")]
    Query(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "Request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [
                (header::CONTENT_TYPE, TEXT_PLAIN_UTF8),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            format!("Oops, something went wrong. Error: {self}"),
        )
            .into_response()
    }
}

/// Errors that stop the server from starting or serving
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No certificate found in {0}")]
    MissingCertificate(String),

    #[error("No private key found in {0}")]
    MissingPrivateKey(String),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Schema initialization failed: {0}")]
    Schema(#[from] StorageError),

    #[error("Metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_error_response_shape() {
        let err = ApiError::from(ParamsError::InvalidInputCount { count: 3 });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            TEXT_PLAIN_UTF8
        );
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            &body[..],
            b"Oops, something went wrong. Error: expected two integers in the URL, got 3 parameter(s)"
        );
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err = ApiError::from(StorageError::Overflow { a: 1, b: 2 });
        assert_eq!(err.to_string(), "1 + 2 overflows a 64-bit integer");
    }
}
