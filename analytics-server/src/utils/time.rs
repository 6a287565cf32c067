//! 时间工具函数: 查询窗口归一化
//!
//! 所有日期 → 时间戳转换统一在这里完成 (UTC)，
//! 存储层只接收 `i64` Unix millis。

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 闭区间时间窗口 `[start, end]` (Unix millis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// 时间戳是否落在窗口内 (含两端)
    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start && millis <= self.end
    }
}

/// 日期开始 (00:00:00.000) → Unix millis (UTC)
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
}

/// 日期结束 (23:59:59.999) → Unix millis (UTC)
pub fn day_end_millis(date: NaiveDate) -> i64 {
    match date.succ_opt() {
        Some(next) => day_start_millis(next) - 1,
        None => date
            .and_hms_milli_opt(23, 59, 59, 999)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_else(|| day_start_millis(date)),
    }
}

/// `[from 00:00:00.000, to 23:59:59.999]`
pub fn inclusive_window(from: NaiveDate, to: NaiveDate) -> TimeWindow {
    TimeWindow {
        start: day_start_millis(from),
        end: day_end_millis(to),
    }
}

/// Unix millis → UTC datetime, `None` if out of range
pub fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// 日期 + N 个自然月，溢出时返回 `NaiveDate::MAX`
pub fn add_months_saturating(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// 当前日期 (UTC)
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inclusive_window_bounds() {
        let window = inclusive_window(date(2025, 11, 1), date(2025, 11, 30));
        let start = DateTime::parse_from_rfc3339("2025-11-01T00:00:00Z").unwrap();
        let end = DateTime::parse_from_rfc3339("2025-11-30T23:59:59.999Z").unwrap();
        assert_eq!(window.start, start.timestamp_millis());
        assert_eq!(window.end, end.timestamp_millis());
        assert!(window.contains(window.end));
        assert!(!window.contains(window.end + 1));
        assert!(!window.contains(window.start - 1));
    }

    #[test]
    fn test_single_day_window() {
        let window = inclusive_window(date(2024, 2, 29), date(2024, 2, 29));
        assert_eq!(window.end - window.start, 86_400_000 - 1);
    }

    #[test]
    fn test_add_months_clamps_month_end() {
        assert_eq!(add_months_saturating(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(add_months_saturating(date(2024, 1, 1), 12), date(2025, 1, 1));
        assert_eq!(add_months_saturating(NaiveDate::MAX, 1), NaiveDate::MAX);
    }
}
