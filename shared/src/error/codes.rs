//! Unified error codes for the analytics workspace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Analytics query errors
//! - 6xxx: Export errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as `u16` on the wire. [`ErrorCode::name`] gives the stable
/// machine-readable identifier (`RANGE_EXCEEDED`, ...) that clients match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 1xxx: Analytics query ====================
    /// Query span exceeds the configured maximum window
    RangeExceeded = 1001,
    /// `from` or `to` lies in the future
    FutureDateNotAllowed = 1002,
    /// `from` is after `to`
    InvalidDateRange = 1003,

    // ==================== 6xxx: Export ====================
    /// Unknown export column
    UnknownColumn = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Stable machine-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",

            ErrorCode::RangeExceeded => "RANGE_EXCEEDED",
            ErrorCode::FutureDateNotAllowed => "FUTURE_DATE_NOT_ALLOWED",
            ErrorCode::InvalidDateRange => "INVALID_DATE_RANGE",

            ErrorCode::UnknownColumn => "UNKNOWN_COLUMN",

            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",

            // Analytics query
            ErrorCode::RangeExceeded => "Date range exceeds the maximum allowed window",
            ErrorCode::FutureDateNotAllowed => "Dates in the future are not allowed",
            ErrorCode::InvalidDateRange => "Start date must not be after end date",

            // Export
            ErrorCode::UnknownColumn => "Unknown export column",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ErrorCode::ValidationFailed),

            1001 => Ok(ErrorCode::RangeExceeded),
            1002 => Ok(ErrorCode::FutureDateNotAllowed),
            1003 => Ok(ErrorCode::InvalidDateRange),

            6002 => Ok(ErrorCode::UnknownColumn),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::RangeExceeded.code(), 1001);
        assert_eq!(ErrorCode::FutureDateNotAllowed.code(), 1002);
        assert_eq!(ErrorCode::InvalidDateRange.code(), 1003);
        assert_eq!(ErrorCode::UnknownColumn.code(), 6002);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_stable_names() {
        assert_eq!(ErrorCode::RangeExceeded.name(), "RANGE_EXCEEDED");
        assert_eq!(
            ErrorCode::FutureDateNotAllowed.name(),
            "FUTURE_DATE_NOT_ALLOWED"
        );
        assert_eq!(ErrorCode::InvalidDateRange.name(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_try_from_roundtrip_all_known() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::RangeExceeded,
            ErrorCode::FutureDateNotAllowed,
            ErrorCode::InvalidDateRange,
            ErrorCode::UnknownColumn,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::ConfigError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::RangeExceeded).unwrap();
        assert_eq!(json, "1001");
        let code: ErrorCode = serde_json::from_str("1003").unwrap();
        assert_eq!(code, ErrorCode::InvalidDateRange);
    }
}
