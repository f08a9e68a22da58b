use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// A single field-level constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    /// Offending field, or `non_field_errors` for cross-field constraints.
    #[schema(example = "humidity_requirement")]
    pub field: String,
    #[schema(example = "Ensure this value is less than or equal to 100.")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All violations found in one rejected CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RowError {
    /// 1-based data row number (the header row is not counted).
    #[schema(example = 3)]
    pub row: usize,
    #[schema(example = "Peace Lily")]
    pub common_name: String,
    pub errors: Vec<FieldError>,
}

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `IMPORT_REJECTED`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`,
    /// `USERNAME_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "2 fields failed validation")]
    pub message: String,
    /// Per-field violations, present for field-level validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    /// Per-row violations, present when a CSV import is rejected.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<RowError>,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// One or more fields violate their constraints.
    InvalidFields(Vec<FieldError>),
    /// A CSV batch was rejected; nothing was imported.
    ImportRejected(Vec<RowError>),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    UsernameTaken,
    Internal(String),
}

impl AppError {
    /// Shorthand for a single field violation.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidFields(vec![FieldError::new(field, message)])
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::InvalidFields(errors) => {
                let message = match errors.len() {
                    1 => "1 field failed validation".to_string(),
                    n => format!("{n} fields failed validation"),
                };
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        errors,
                        ..ErrorBody::new("VALIDATION_ERROR", message)
                    },
                )
            }
            AppError::ImportRejected(rows) => {
                let message = match rows.len() {
                    1 => "1 row failed validation; nothing was imported".to_string(),
                    n => format!("{n} rows failed validation; nothing was imported"),
                };
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        rows,
                        ..ErrorBody::new("IMPORT_REJECTED", message)
                    },
                )
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody::new("USERNAME_TAKEN", "Username is already taken"),
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds the {limit} byte upload limit"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
