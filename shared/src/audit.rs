//! Consistency audit DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How far a reported metric drifted from its recomputed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Headline metrics checked by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditMetric {
    OrderCount,
    CancelledCount,
    Revenue,
    LostRevenue,
}

impl AuditMetric {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::OrderCount | Self::CancelledCount)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCount => "orderCount",
            Self::CancelledCount => "cancelledCount",
            Self::Revenue => "revenue",
            Self::LostRevenue => "lostRevenue",
        }
    }
}

/// One reported-vs-actual mismatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub metric: AuditMetric,
    pub reported_value: f64,
    pub actual_value: f64,
    /// `None` when the actual value is zero and the reported one is not
    pub percent_difference: Option<f64>,
    pub severity: Severity,
}

/// Result of one audit pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub is_valid: bool,
    pub discrepancies: Vec<Discrepancy>,
}

/// Audit endpoint payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub success: bool,
    pub discrepancies: Vec<Discrepancy>,
    /// Unix millis
    pub timestamp: i64,
}

impl AuditResponse {
    pub fn from_report(report: AuditReport, timestamp: i64) -> Self {
        Self {
            success: report.is_valid,
            discrepancies: report.discrepancies,
            timestamp,
        }
    }
}

/// Out-of-band alert raised for CRITICAL drift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditAlert {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub discrepancies: Vec<Discrepancy>,
    pub message: String,
    /// Unix millis
    pub raised_at: i64,
}
