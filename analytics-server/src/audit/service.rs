//! 一致性审计
//!
//! 直接从订单存储重新计算核心指标 (订单数、取消数、营收、取消损失)，
//! 与统计接口报告的数值对比。重算刻意不走聚合管道：
//! 计数用 `count_orders`，金额累加订单 `total_amount`。

use std::sync::Arc;

use chrono::NaiveDate;
use shared::analytics::{AnalyticsQuery, Summary};
use shared::audit::{AuditAlert, AuditMetric, AuditReport, Discrepancy, Severity};
use shared::models::OrderStatus;
use shared::util::now_millis;

use super::alert::AlertSink;
use crate::analytics::{AnalyticsOutcome, AnalyticsService};
use crate::db::OrderStore;
use crate::utils::AppResult;
use crate::utils::money;
use crate::utils::time::{self, TimeWindow};

/// Advisory text attached to every critical alert
pub const ALERT_MESSAGE: &str =
    "Critical analytics discrepancy detected, reported figures must be reconciled before use";

/// 严重度阈值 (百分比，严格大于)
const CRITICAL_ABOVE: f64 = 5.0;
const HIGH_ABOVE: f64 = 1.0;
const MEDIUM_ABOVE: f64 = 0.5;

/// Headline metrics on either side of the comparison
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Headline {
    pub order_count: u64,
    pub cancelled_count: u64,
    pub revenue: f64,
    pub lost_revenue: f64,
}

impl From<&Summary> for Headline {
    fn from(summary: &Summary) -> Self {
        Self {
            order_count: summary.order_count,
            cancelled_count: summary.cancelled_count,
            revenue: summary.revenue,
            lost_revenue: summary.lost_revenue,
        }
    }
}

/// `|reported − actual| / actual × 100`
///
/// `None` when `actual` is zero and `reported` is not.
pub fn percent_difference(reported: f64, actual: f64) -> Option<f64> {
    if actual == 0.0 {
        return if reported == 0.0 { Some(0.0) } else { None };
    }
    Some((reported - actual).abs() / actual.abs() * 100.0)
}

/// Map a percent difference to a severity; undefined is critical
pub fn classify_severity(percent: Option<f64>) -> Severity {
    match percent {
        None => Severity::Critical,
        Some(p) if p > CRITICAL_ABOVE => Severity::Critical,
        Some(p) if p > HIGH_ABOVE => Severity::High,
        Some(p) if p > MEDIUM_ABOVE => Severity::Medium,
        Some(_) => Severity::Low,
    }
}

/// Compare reported against recomputed metrics
///
/// Count mismatches always fail the audit and are at least HIGH. Monetary
/// mismatches below one cent are ignored; above it they are recorded and
/// fail the audit only past `tolerance_percent`.
pub fn evaluate(reported: &Headline, actual: &Headline, tolerance_percent: f64) -> AuditReport {
    let mut discrepancies = Vec::new();
    let mut is_valid = true;

    let counts = [
        (AuditMetric::OrderCount, reported.order_count, actual.order_count),
        (
            AuditMetric::CancelledCount,
            reported.cancelled_count,
            actual.cancelled_count,
        ),
    ];
    for (metric, reported, actual) in counts {
        if reported == actual {
            continue;
        }
        let percent = percent_difference(reported as f64, actual as f64);
        is_valid = false;
        discrepancies.push(Discrepancy {
            metric,
            reported_value: reported as f64,
            actual_value: actual as f64,
            percent_difference: percent,
            severity: classify_severity(percent).max(Severity::High),
        });
    }

    let amounts = [
        (AuditMetric::Revenue, reported.revenue, actual.revenue),
        (AuditMetric::LostRevenue, reported.lost_revenue, actual.lost_revenue),
    ];
    for (metric, reported, actual) in amounts {
        if money::money_eq(reported, actual) {
            continue;
        }
        let percent = percent_difference(reported, actual);
        if percent.is_none_or(|p| p > tolerance_percent) {
            is_valid = false;
        }
        discrepancies.push(Discrepancy {
            metric,
            reported_value: reported,
            actual_value: actual,
            percent_difference: percent,
            severity: classify_severity(percent),
        });
    }

    AuditReport {
        is_valid,
        discrepancies,
    }
}

#[derive(Clone)]
pub struct ConsistencyAuditor {
    store: Arc<dyn OrderStore>,
    analytics: AnalyticsService,
    alerts: Arc<dyn AlertSink>,
    tolerance_percent: f64,
}

impl ConsistencyAuditor {
    pub fn new(
        store: Arc<dyn OrderStore>,
        analytics: AnalyticsService,
        alerts: Arc<dyn AlertSink>,
        tolerance_percent: f64,
    ) -> Self {
        Self {
            store,
            analytics,
            alerts,
            tolerance_percent,
        }
    }

    pub fn tolerance_percent(&self) -> f64 {
        self.tolerance_percent
    }

    /// Audit what the analytics endpoint currently reports for `query`
    pub async fn audit(&self, query: &AnalyticsQuery) -> AppResult<AuditReport> {
        self.audit_as_of(query, time::today_utc()).await
    }

    pub async fn audit_as_of(
        &self,
        query: &AnalyticsQuery,
        today: NaiveDate,
    ) -> AppResult<AuditReport> {
        let reported = match self.analytics.compute_as_of(query, today).await? {
            AnalyticsOutcome::Data(response) => Headline::from(&response.summary),
            AnalyticsOutcome::NoData => Headline::default(),
        };
        self.audit_reported(query, &reported).await
    }

    /// Audit externally supplied figures for `query`
    pub async fn audit_reported(
        &self,
        query: &AnalyticsQuery,
        reported: &Headline,
    ) -> AppResult<AuditReport> {
        let window = time::inclusive_window(query.from, query.to);
        let actual = self.recompute(window).await?;
        let report = evaluate(reported, &actual, self.tolerance_percent);

        tracing::debug!(
            from = %query.from,
            to = %query.to,
            valid = report.is_valid,
            discrepancies = report.discrepancies.len(),
            "Audit evaluated"
        );

        if report
            .discrepancies
            .iter()
            .any(|d| d.severity == Severity::Critical)
        {
            self.alerts.raise(&AuditAlert {
                from: query.from,
                to: query.to,
                discrepancies: report.discrepancies.clone(),
                message: ALERT_MESSAGE.to_string(),
                raised_at: now_millis(),
            });
        }

        Ok(report)
    }

    /// Ground truth straight from raw orders
    async fn recompute(&self, window: TimeWindow) -> AppResult<Headline> {
        let order_count = self.store.count_orders(window, OrderStatus::REVENUE).await?;
        let cancelled_count = self
            .store
            .count_orders(window, OrderStatus::CANCELLED)
            .await?;
        let fulfilled = self.store.find_orders(window, OrderStatus::REVENUE).await?;
        let cancelled = self.store.find_orders(window, OrderStatus::CANCELLED).await?;

        Ok(Headline {
            order_count,
            cancelled_count,
            revenue: money::sum_money(fulfilled.iter().map(|o| o.total_amount)),
            lost_revenue: money::sum_money(cancelled.iter().map(|o| o.total_amount)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headline(orders: u64, revenue: f64) -> Headline {
        Headline {
            order_count: orders,
            cancelled_count: 0,
            revenue,
            lost_revenue: 0.0,
        }
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(classify_severity(Some(5.01)), Severity::Critical);
        assert_eq!(classify_severity(Some(5.0)), Severity::High);
        assert_eq!(classify_severity(Some(1.5)), Severity::High);
        assert_eq!(classify_severity(Some(1.0)), Severity::Medium);
        assert_eq!(classify_severity(Some(0.6)), Severity::Medium);
        assert_eq!(classify_severity(Some(0.5)), Severity::Low);
        assert_eq!(classify_severity(Some(0.0)), Severity::Low);
        assert_eq!(classify_severity(None), Severity::Critical);
    }

    #[test]
    fn test_percent_difference_zero_actual() {
        assert_eq!(percent_difference(0.0, 0.0), Some(0.0));
        assert_eq!(percent_difference(3.0, 0.0), None);
        assert_eq!(percent_difference(110.0, 100.0), Some(10.0));
    }

    #[test]
    fn test_matching_metrics_are_valid() {
        let report = evaluate(&headline(3, 58.0), &headline(3, 58.0), 1.0);
        assert!(report.is_valid);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn test_large_revenue_drift_is_critical() {
        let report = evaluate(&headline(3, 110.0), &headline(3, 100.0), 1.0);
        assert!(!report.is_valid);
        assert_eq!(report.discrepancies.len(), 1);
        let d = &report.discrepancies[0];
        assert_eq!(d.metric, AuditMetric::Revenue);
        assert_eq!(d.severity, Severity::Critical);
    }

    #[test]
    fn test_small_revenue_drift_is_low_and_valid() {
        let report = evaluate(&headline(3, 1003.0), &headline(3, 1000.0), 1.0);
        assert!(report.is_valid);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].severity, Severity::Low);
    }

    #[test]
    fn test_medium_drift_within_tolerance() {
        let report = evaluate(&headline(3, 100.8), &headline(3, 100.0), 1.0);
        assert!(report.is_valid);
        assert_eq!(report.discrepancies[0].severity, Severity::Medium);
    }

    #[test]
    fn test_count_mismatch_always_invalid() {
        let report = evaluate(&headline(100, 0.0), &headline(101, 0.0), 1.0);
        assert!(!report.is_valid);
        let d = &report.discrepancies[0];
        assert_eq!(d.metric, AuditMetric::OrderCount);
        // under 1% but counts are floored at HIGH
        assert_eq!(d.severity, Severity::High);
    }

    #[test]
    fn test_sub_cent_difference_ignored() {
        let report = evaluate(&headline(1, 10.001), &headline(1, 10.0), 1.0);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn test_reported_against_zero_actual() {
        let reported = Headline {
            lost_revenue: 12.0,
            ..Headline::default()
        };
        let report = evaluate(&reported, &Headline::default(), 1.0);
        assert!(!report.is_valid);
        assert_eq!(report.discrepancies[0].percent_difference, None);
        assert_eq!(report.discrepancies[0].severity, Severity::Critical);
    }
}
