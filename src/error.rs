//! Error types for AssetDesk server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes returned alongside every error response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchData = 4,
    NoSuchPart = 5,
    NoSuchSoftware = 6,
    NoSuchLicense = 7,
    InsufficientStock = 8,
    NoInventoryAvailable = 9,
    LicenseExhausted = 10,
    LicenseIdentificationMissing = 11,
    ConcurrentUpdate = 12,
    BadValue = 18,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No catalog part matches {0}")]
    PartNotFound(String),

    #[error("No software matches {0}")]
    SoftwareNotFound(String),

    #[error("License not found: {0}")]
    LicenseNotFound(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("No inventory available for {0}")]
    NoInventoryAvailable(String),

    #[error("License exhausted: {0}")]
    LicenseExhausted(String),

    #[error("A license key or account user is required for {0}")]
    LicenseIdentifierMissing(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Postgres aborted the transaction to break a deadlock or a
    /// serialization conflict; the whole operation may be run again
    #[error("Concurrent update conflict: {0}")]
    Contention(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and numeric code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
            AppError::PartNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchPart),
            AppError::SoftwareNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchSoftware),
            AppError::LicenseNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchLicense),
            AppError::InsufficientStock(_) => (StatusCode::CONFLICT, ErrorCode::InsufficientStock),
            AppError::NoInventoryAvailable(_) => {
                (StatusCode::CONFLICT, ErrorCode::NoInventoryAvailable)
            }
            AppError::LicenseExhausted(_) => (StatusCode::CONFLICT, ErrorCode::LicenseExhausted),
            AppError::LicenseIdentifierMissing(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::LicenseIdentificationMissing)
            }
            AppError::InvalidRequest(_) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue)
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Contention(_) => (StatusCode::CONFLICT, ErrorCode::ConcurrentUpdate),
            AppError::BusinessRule(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::Failure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

/// SQLSTATE of a transaction chosen as deadlock victim
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE of a transaction that could not be serialized
const SERIALIZATION_FAILURE: &str = "40001";

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            if matches!(db.code().as_deref(), Some(DEADLOCK_DETECTED) | Some(SERIALIZATION_FAILURE)) {
                return AppError::Contention(db.message().to_string());
            }
        }
        AppError::Database(error)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
