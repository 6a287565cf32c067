//! Period strategies
//!
//! Map a timestamp to a bucket key. Every key scheme is zero-padded so that
//! lexicographic order equals chronological order:
//!
//! | granularity | key | example |
//! |-------------|-----|---------|
//! | day | `YYYY-MM-DD` | `2025-09-03` |
//! | week | ISO-8601 `YYYY-WW` | `2025-01` (for 2024-12-30) |
//! | month | `YYYY-MM` | `2025-09` |
//! | year | `YYYY` | `2025` |

use chrono::{DateTime, Datelike, Utc};
use shared::analytics::GroupBy;

use crate::utils::time;

/// Bucketing strategy for one granularity
///
/// Stateless and `Copy`; build one per request or share freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodStrategy {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodStrategy {
    /// Factory: resolve a granularity tag, unknown tags fall back to `Month`
    pub fn from_tag(tag: &str) -> Self {
        Self::from(GroupBy::from_tag(tag))
    }

    /// Granularity this strategy buckets by
    pub fn granularity(&self) -> GroupBy {
        match self {
            Self::Day => GroupBy::Day,
            Self::Week => GroupBy::Week,
            Self::Month => GroupBy::Month,
            Self::Year => GroupBy::Year,
        }
    }

    /// Bucket key for a UTC instant
    pub fn format(&self, at: &DateTime<Utc>) -> String {
        match self {
            Self::Day => format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day()),
            Self::Week => {
                // ISO week-year can differ from the calendar year around Jan 1
                let week = at.iso_week();
                format!("{:04}-{:02}", week.year(), week.week())
            }
            Self::Month => format!("{:04}-{:02}", at.year(), at.month()),
            Self::Year => format!("{:04}", at.year()),
        }
    }

    /// Bucket key for a Unix-millis timestamp
    pub fn format_millis(&self, millis: i64) -> Option<String> {
        time::millis_to_utc(millis).map(|at| self.format(&at))
    }

    /// strftime pattern producing the same key as [`format`](Self::format)
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Week => "%G-%V",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        }
    }

    /// Database-side bucketing expression over a Unix-millis field
    pub fn bucket_expression(&self, field: &str) -> String {
        format!(
            "time::format(time::from::millis({}), '{}')",
            field,
            self.pattern()
        )
    }
}

impl From<GroupBy> for PeriodStrategy {
    fn from(group_by: GroupBy) -> Self {
        match group_by {
            GroupBy::Day => Self::Day,
            GroupBy::Week => Self::Week,
            GroupBy::Month => Self::Month,
            GroupBy::Year => Self::Year,
        }
    }
}
