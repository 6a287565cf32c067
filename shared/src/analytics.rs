//! Analytics query and response DTOs
//!
//! Wire shape is camelCase to match the dashboard client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default leaderboard size
pub const DEFAULT_TOP: u32 = 10;

/// Time bucket granularity
///
/// Deserialization is lenient: unknown tags resolve to [`GroupBy::Month`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum GroupBy {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl GroupBy {
    /// Resolve a granularity tag, falling back to `Month`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            other => {
                tracing::debug!(tag = %other, "Unknown groupBy tag, using month");
                Self::Month
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl From<String> for GroupBy {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analytics query (`from`/`to` are inclusive calendar dates)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub group_by: GroupBy,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub top: Option<u32>,
}

impl AnalyticsQuery {
    pub fn new(from: NaiveDate, to: NaiveDate, group_by: GroupBy) -> Self {
        Self {
            from,
            to,
            group_by,
            top: None,
        }
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }
}

/// Revenue bucket (fulfilled orders)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub period: String,
    pub order_count: u64,
    pub revenue: f64,
}

/// Cancellation bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledSeriesPoint {
    pub period: String,
    pub cancelled_count: u64,
    pub lost_revenue: f64,
}

/// Leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAggregate {
    pub product_key: String,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: f64,
}

/// Queried window as echoed back to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeView {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub group_by: GroupBy,
}

/// Rollup over the whole window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub order_count: u64,
    pub revenue: f64,
    pub cancelled_count: u64,
    pub lost_revenue: f64,
    /// No preparation timestamps are recorded yet; always serialized as `null`
    pub avg_prep_time: Option<f64>,
}

/// Analytics response, built fresh per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub range: DateRangeView,
    pub summary: Summary,
    pub series: Vec<SeriesPoint>,
    pub cancelled_series: Vec<CancelledSeriesPoint>,
    pub products_sold: Vec<ProductAggregate>,
    #[serde(rename = "topNProducts")]
    pub top_n_products: Vec<ProductAggregate>,
    pub message: String,
}
