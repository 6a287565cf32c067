//! Shared types for the analytics workspace
//!
//! Order records, analytics and audit DTOs, and the unified error system.

pub mod analytics;
pub mod audit;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use analytics::{AnalyticsQuery, AnalyticsResponse, GroupBy};
pub use audit::{AuditReport, Discrepancy, Severity};
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
