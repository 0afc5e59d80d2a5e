//! Error types for the RT/RW administration server
//!
//! All errors use thiserror for structured error handling.
//! Every error maps onto an HTTP status and a JSON `{"error": ...}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::period::DuesMonth;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Dues for {month} at address '{address}' have already been paid")]
    DuplicatePayment { address: String, month: DuesMonth },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicatePayment { .. }
            | AppError::Spreadsheet(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) if is_unique_violation(e) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// True when the database rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else if matches!(self, AppError::Database(_)) {
            "A record with the same unique value already exists".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("Address", "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Generic("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_payment_message_names_address() {
        let err = AppError::DuplicatePayment {
            address: "Jl. Melati No. 3".to_string(),
            month: DuesMonth::new(2025, 3).unwrap(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Dues for 2025-03 at address 'Jl. Melati No. 3' have already been paid"
        );
    }
}
