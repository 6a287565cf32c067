//! Consistency audit against raw orders

mod common;

use std::sync::Arc;

use analytics_server::audit::service::Headline;
use analytics_server::audit::{BroadcastAlertSink, ConsistencyAuditor};
use analytics_server::{AnalyticsService, InMemoryOrderStore, OrderStore};
use common::{date, policy, sample_orders, sample_store};
use shared::analytics::{AnalyticsQuery, GroupBy};
use shared::audit::{AuditMetric, Severity};

fn query() -> AnalyticsQuery {
    AnalyticsQuery::new(date(2025, 11, 1), date(2025, 12, 31), GroupBy::Month)
}

fn auditor(store: Arc<dyn OrderStore>) -> (ConsistencyAuditor, BroadcastAlertSink) {
    let alerts = BroadcastAlertSink::new(8);
    let analytics = AnalyticsService::new(store.clone(), policy());
    let auditor = ConsistencyAuditor::new(store, analytics, Arc::new(alerts.clone()), 1.0);
    (auditor, alerts)
}

#[tokio::test]
async fn consistent_store_passes() {
    let (auditor, alerts) = auditor(sample_store());
    let mut rx = alerts.subscribe();
    let report = auditor.audit_as_of(&query(), date(2026, 1, 15)).await.unwrap();
    assert!(report.is_valid);
    assert!(report.discrepancies.is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn inflated_totals_are_critical_and_alert() {
    // Stored total disagrees with the line items the pipeline sums
    let mut orders = sample_orders();
    orders[0].total_amount = 30.0;
    let store: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::with_orders(orders));
    let (auditor, alerts) = auditor(store);
    let mut rx = alerts.subscribe();

    let report = auditor.audit_as_of(&query(), date(2026, 1, 15)).await.unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.discrepancies.len(), 1);
    let d = &report.discrepancies[0];
    assert_eq!(d.metric, AuditMetric::Revenue);
    assert_eq!(d.reported_value, 58.0);
    assert_eq!(d.actual_value, 68.0);
    assert_eq!(d.severity, Severity::Critical);

    let alert = rx.try_recv().unwrap();
    assert_eq!(alert.from, date(2025, 11, 1));
    assert_eq!(alert.to, date(2025, 12, 31));
    assert_eq!(alert.discrepancies, report.discrepancies);
}

#[tokio::test]
async fn small_drift_is_low_and_valid() {
    let (auditor, alerts) = auditor(sample_store());
    let mut rx = alerts.subscribe();
    let reported = Headline {
        order_count: 3,
        cancelled_count: 1,
        // 0.3% above the 58.00 ground truth
        revenue: 58.17,
        lost_revenue: 7.5,
    };
    let report = auditor.audit_reported(&query(), &reported).await.unwrap();
    assert!(report.is_valid);
    assert_eq!(report.discrepancies.len(), 1);
    assert_eq!(report.discrepancies[0].severity, Severity::Low);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn count_mismatch_fails_audit() {
    let (auditor, _alerts) = auditor(sample_store());
    let reported = Headline {
        order_count: 2,
        cancelled_count: 1,
        revenue: 58.0,
        lost_revenue: 7.5,
    };
    let report = auditor.audit_reported(&query(), &reported).await.unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.discrepancies[0].metric, AuditMetric::OrderCount);
}

#[tokio::test]
async fn audit_propagates_validation_errors() {
    let (auditor, _alerts) = auditor(sample_store());
    let reversed = AnalyticsQuery::new(date(2025, 12, 31), date(2025, 11, 1), GroupBy::Month);
    let err = auditor
        .audit_as_of(&reversed, date(2026, 1, 15))
        .await
        .unwrap_err();
    assert_eq!(err.code_name(), "INVALID_DATE_RANGE");
}
