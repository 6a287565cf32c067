//! Aggregation orchestrator
//!
//! Validates an [`AnalyticsQuery`], runs the series, cancelled-series and
//! leaderboard pipelines against the injected [`OrderStore`], then hands the
//! raw rows to the shaper.

use std::sync::Arc;

use chrono::NaiveDate;
use shared::analytics::{AnalyticsQuery, AnalyticsResponse};
use shared::models::OrderStatus;
use validator::Validate;

use super::period::PeriodStrategy;
use super::pipeline::{AggregateRow, PipelineError, product_pipeline, series_pipeline};
use super::shaper;
use crate::core::config::AnalyticsPolicy;
use crate::db::OrderStore;
use crate::utils::time::{self, TimeWindow};
use crate::utils::{AppError, AppResult};

/// Result of a computation: data, or nothing at all in the window
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsOutcome {
    Data(AnalyticsResponse),
    /// Both the revenue and the cancelled series are empty
    NoData,
}

impl AnalyticsOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    pub fn into_response(self) -> Option<AnalyticsResponse> {
        match self {
            Self::Data(response) => Some(response),
            Self::NoData => None,
        }
    }
}

/// Raw grouped rows from the three passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAggregates {
    pub series: Vec<AggregateRow>,
    pub cancelled: Vec<AggregateRow>,
    pub products: Vec<AggregateRow>,
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::internal(format!("Failed to build aggregation pipeline: {}", err))
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn OrderStore>,
    policy: AnalyticsPolicy,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn OrderStore>, policy: AnalyticsPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &AnalyticsPolicy {
        &self.policy
    }

    /// Reject bad queries before any store access
    ///
    /// Checks run in a fixed order so the first failure is deterministic:
    /// reversed range, future dates, span, then field rules.
    pub fn validate_query(&self, query: &AnalyticsQuery, today: NaiveDate) -> AppResult<()> {
        if query.from > query.to {
            return Err(AppError::invalid_date_range(query.from, query.to));
        }
        if query.to > today {
            return Err(AppError::future_date(query.to));
        }
        if query.from > today {
            return Err(AppError::future_date(query.from));
        }
        let limit = time::add_months_saturating(query.from, self.policy.max_range_months);
        if query.to > limit {
            return Err(AppError::range_exceeded(self.policy.max_range_months));
        }
        query.validate()?;
        Ok(())
    }

    pub fn effective_top(&self, query: &AnalyticsQuery) -> usize {
        query.top.unwrap_or(self.policy.default_top) as usize
    }

    /// Compute analytics for `query` against the current UTC date
    pub async fn compute(&self, query: &AnalyticsQuery) -> AppResult<AnalyticsOutcome> {
        self.compute_as_of(query, time::today_utc()).await
    }

    /// Compute analytics treating `today` as the current date
    pub async fn compute_as_of(
        &self,
        query: &AnalyticsQuery,
        today: NaiveDate,
    ) -> AppResult<AnalyticsOutcome> {
        self.validate_query(query, today)?;

        let window = time::inclusive_window(query.from, query.to);
        let strategy = PeriodStrategy::from(query.group_by);
        let raw = self.collect(window, strategy, self.effective_top(query)).await?;

        if raw.series.is_empty() && raw.cancelled.is_empty() {
            tracing::debug!(
                from = %query.from,
                to = %query.to,
                group_by = %query.group_by,
                "No analytics data in range"
            );
            return Ok(AnalyticsOutcome::NoData);
        }

        let response = shaper::shape(query, raw);
        tracing::debug!(
            from = %query.from,
            to = %query.to,
            periods = response.series.len(),
            products = response.products_sold.len(),
            "Analytics computed"
        );
        Ok(AnalyticsOutcome::Data(response))
    }

    async fn collect(
        &self,
        window: TimeWindow,
        strategy: PeriodStrategy,
        top: usize,
    ) -> AppResult<RawAggregates> {
        let revenue = series_pipeline(window, OrderStatus::REVENUE, strategy)?;
        let lost = series_pipeline(window, OrderStatus::CANCELLED, strategy)?;

        // 两个序列互不依赖，并发执行
        let (series, cancelled) = tokio::try_join!(
            self.store.aggregate(&revenue),
            self.store.aggregate(&lost)
        )?;

        let products = if series.is_empty() {
            Vec::new()
        } else {
            let leaderboard = product_pipeline(window, OrderStatus::REVENUE, top)?;
            self.store.aggregate(&leaderboard).await?
        };

        Ok(RawAggregates {
            series,
            cancelled,
            products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryOrderStore;
    use shared::analytics::GroupBy;
    use shared::error::ErrorCode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(max_months: u32) -> AnalyticsService {
        AnalyticsService::new(
            Arc::new(InMemoryOrderStore::new()),
            AnalyticsPolicy {
                max_range_months: max_months,
                default_top: 10,
            },
        )
    }

    #[test]
    fn test_reversed_range_rejected_first() {
        let svc = service(12);
        // Reversed and in the future: the range check wins
        let query = AnalyticsQuery::new(date(2031, 2, 1), date(2031, 1, 1), GroupBy::Month);
        let err = svc.validate_query(&query, date(2025, 6, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateRange);
    }

    #[test]
    fn test_future_date_rejected() {
        let svc = service(12);
        let query = AnalyticsQuery::new(date(2025, 5, 1), date(2025, 6, 2), GroupBy::Day);
        let err = svc.validate_query(&query, date(2025, 6, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::FutureDateNotAllowed);
        // Today itself is allowed
        let query = AnalyticsQuery::new(date(2025, 5, 1), date(2025, 6, 1), GroupBy::Day);
        assert!(svc.validate_query(&query, date(2025, 6, 1)).is_ok());
    }

    #[test]
    fn test_range_boundary() {
        let svc = service(12);
        let today = date(2026, 1, 1);
        let exact = AnalyticsQuery::new(date(2024, 3, 1), date(2025, 3, 1), GroupBy::Month);
        assert!(svc.validate_query(&exact, today).is_ok());

        let over = AnalyticsQuery::new(date(2024, 3, 1), date(2025, 3, 2), GroupBy::Month);
        let err = svc.validate_query(&over, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::RangeExceeded);
        assert_eq!(err.code_name(), "RANGE_EXCEEDED");
    }

    #[test]
    fn test_top_zero_rejected() {
        let svc = service(12);
        let query =
            AnalyticsQuery::new(date(2025, 1, 1), date(2025, 1, 31), GroupBy::Day).with_top(0);
        let err = svc.validate_query(&query, date(2025, 6, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_effective_top_defaults_to_policy() {
        let svc = service(12);
        let query = AnalyticsQuery::new(date(2025, 1, 1), date(2025, 1, 31), GroupBy::Day);
        assert_eq!(svc.effective_top(&query), 10);
        assert_eq!(svc.effective_top(&query.with_top(3)), 3);
    }

    #[tokio::test]
    async fn test_empty_window_is_no_data() {
        let svc = service(12);
        let query = AnalyticsQuery::new(date(2025, 1, 1), date(2025, 1, 31), GroupBy::Day);
        let outcome = svc.compute_as_of(&query, date(2025, 6, 1)).await.unwrap();
        assert!(outcome.is_no_data());
        assert!(outcome.into_response().is_none());
    }
}
