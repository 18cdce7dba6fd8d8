use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Only HTTPS URLs are supported.")]
    UnsupportedScheme,

    #[error("{0}")]
    ConnectionFailed(String),

    #[error("No server certificates found.")]
    NoServerCertificate,

    #[error("Error while processing the SSL certificate: {0}")]
    MalformedCertificate(String),

    #[error("Certificate with ID {0} not found")]
    NotFound(i64),

    #[error("No certificates found in the database")]
    EmptyCollection,

    #[error("Error deleting the certificate")]
    DeleteFailed(#[source] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AppError {
    /// Machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            AppError::ConnectionFailed(_) => "CONNECTION_FAILED",
            AppError::NoServerCertificate => "NO_SERVER_CERTIFICATE",
            AppError::MalformedCertificate(_) => "MALFORMED_CERTIFICATE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EmptyCollection => "NO_CONTENT",
            AppError::DeleteFailed(_) => "DELETE_FAILED",
            AppError::Storage(_) => "STORAGE_ERROR",
        }
    }

    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidInput(_)
            | AppError::UnsupportedScheme
            | AppError::ConnectionFailed(_)
            | AppError::NoServerCertificate
            | AppError::MalformedCertificate(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing certificate",
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Certificate not Found"),
            AppError::EmptyCollection => (StatusCode::NOT_FOUND, "No Content Found"),
            AppError::DeleteFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error deleting the certificate",
            ),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title) = self.status_and_title();

        let body = Json(json!({
            "success": false,
            "status": status.as_u16(),
            "error": title,
            "message": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
