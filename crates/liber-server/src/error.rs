//! Error types for the server.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use liber_oauth::OAuthError;
use liber_store::StoreError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Sign-in handshake failure, surfaced with an actionable message.
    #[error("{0}")]
    Auth(#[from] OAuthError),

    /// Database/storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::BookNotFound(id) => ServerError::NotFound(format!("book {id}")),
            // Reserve conflicts are handled in the reserve handler as a
            // normal page; one reaching here is a programming error.
            StoreError::AlreadyReserved(id) => {
                ServerError::Internal(format!("unhandled reservation conflict for book {id}"))
            }
            StoreError::Database(e) => ServerError::Storage(e.to_string()),
            StoreError::Migration(msg) => ServerError::Storage(msg),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Auth(e) => match e {
                OAuthError::Provider { .. } => StatusCode::UNAUTHORIZED,
                OAuthError::Network(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            },
            ServerError::Storage(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = self.to_string();

        match &self {
            ServerError::Storage(_) | ServerError::Internal(_) => {
                tracing::error!(status = %status, error = %message, "server error");
            }
            _ => {
                tracing::warn!(status = %status, error = %message, "client error");
            }
        }

        let body = crate::pages::error_page(status, &message);
        (status, Html(body.into_string())).into_response()
    }
}
