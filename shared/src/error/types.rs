//! Error types and API response structures

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Internal failure whose message stays in the logs
    pub fn is_system(&self) -> bool {
        self.code.category() == ErrorCategory::System
    }

    /// Stable machine-readable code (`RANGE_EXCEEDED`, ...)
    pub fn code_name(&self) -> &'static str {
        self.code.name()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Query-level rejection carrying the stable code name in `details.error_code`
    pub fn query(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::with_message(code, msg).with_detail("error_code", code.name())
    }

    /// Span between `from` and `to` is wider than the allowed window
    pub fn range_exceeded(max_months: u32) -> Self {
        Self::query(
            ErrorCode::RangeExceeded,
            format!("Date range cannot exceed {} months", max_months),
        )
        .with_detail("max_months", max_months)
    }

    /// `from` or `to` is after today
    pub fn future_date(date: impl std::fmt::Display) -> Self {
        Self::query(
            ErrorCode::FutureDateNotAllowed,
            format!("Date {} is in the future", date),
        )
    }

    /// `from` is after `to`
    pub fn invalid_date_range(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::query(
            ErrorCode::InvalidDateRange,
            format!("Start date {} is after end date {}", from, to),
        )
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        Self::validation(errors.to_string()).with_detail("fields", fields)
    }
}

/// Error response body
///
/// - `code`: numeric error code
/// - `message`: Human-readable message
/// - `details`: Additional error details (`error_code`, field names, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl ApiResponse {
    /// Create an error response from an AppError
    ///
    /// 系统错误只记录日志，响应里用通用消息
    pub fn error(err: &AppError) -> Self {
        let message = if err.is_system() {
            err.code.message().to_string()
        } else {
            err.message.clone()
        };
        Self {
            code: err.code.code(),
            message,
            details: err.details.clone(),
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::error(&self);

        if self.is_system() {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}
