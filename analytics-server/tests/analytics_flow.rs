//! End-to-end analytics: orchestrator, shaper and CSV export over the
//! in-memory store.

mod common;

use std::sync::Arc;

use analytics_server::analytics::csv_export::{BOM, Column, CsvExport, NO_DATA_MESSAGE};
use analytics_server::{AnalyticsOutcome, AnalyticsService, ErrorCode, InMemoryOrderStore};
use common::{date, policy, sample_store};
use shared::analytics::{AnalyticsQuery, GroupBy};

fn service() -> AnalyticsService {
    AnalyticsService::new(sample_store(), policy())
}

fn query() -> AnalyticsQuery {
    AnalyticsQuery::new(date(2025, 11, 1), date(2025, 12, 31), GroupBy::Month).with_top(3)
}

async fn compute(query: &AnalyticsQuery) -> AnalyticsOutcome {
    service()
        .compute_as_of(query, date(2026, 1, 15))
        .await
        .unwrap()
}

#[tokio::test]
async fn monthly_series_and_summary() {
    let response = compute(&query()).await.into_response().unwrap();

    let series: Vec<(&str, u64, f64)> = response
        .series
        .iter()
        .map(|p| (p.period.as_str(), p.order_count, p.revenue))
        .collect();
    assert_eq!(series, vec![("2025-11", 2, 40.0), ("2025-12", 1, 18.0)]);
    assert_eq!(response.summary.order_count, 3);
    assert_eq!(response.summary.revenue, 58.0);

    assert_eq!(response.cancelled_series.len(), 1);
    assert_eq!(response.cancelled_series[0].period, "2025-12");
    assert_eq!(response.summary.cancelled_count, 1);
    assert_eq!(response.summary.lost_revenue, 7.5);
    assert_eq!(response.summary.avg_prep_time, None);
}

#[tokio::test]
async fn leaderboard_ranks_by_quantity() {
    let response = compute(&query()).await.into_response().unwrap();
    let keys: Vec<&str> = response
        .products_sold
        .iter()
        .map(|p| p.product_key.as_str())
        .collect();
    // soda 7, then pizza/pasta tie at 1 broken by key; pending and cancelled excluded
    assert_eq!(keys, vec!["soda", "pasta", "pizza"]);
    assert_eq!(response.products_sold[0].quantity_sold, 7);
    assert_eq!(response.products_sold[0].revenue, 28.0);
    assert_eq!(response.top_n_products, response.products_sold);

    let top1 = compute(&query().with_top(1)).await.into_response().unwrap();
    assert_eq!(top1.products_sold.len(), 1);
}

#[tokio::test]
async fn series_keys_strictly_increase() {
    let q = AnalyticsQuery::new(date(2025, 11, 1), date(2025, 12, 31), GroupBy::Day);
    let response = compute(&q).await.into_response().unwrap();
    let keys: Vec<&str> = response.series.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(keys, vec!["2025-11-03", "2025-11-20", "2025-12-05"]);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn cancelled_only_window_still_has_data() {
    let q = AnalyticsQuery::new(date(2025, 12, 9), date(2025, 12, 9), GroupBy::Day);
    let response = compute(&q).await.into_response().unwrap();
    assert!(response.series.is_empty());
    assert!(response.products_sold.is_empty());
    assert_eq!(response.summary.cancelled_count, 1);
}

#[tokio::test]
async fn empty_window_returns_no_data() {
    let q = AnalyticsQuery::new(date(2025, 1, 1), date(2025, 1, 31), GroupBy::Week);
    assert!(compute(&q).await.is_no_data());

    // Pending orders alone do not count as data
    let q = AnalyticsQuery::new(date(2025, 12, 10), date(2025, 12, 10), GroupBy::Day);
    assert!(compute(&q).await.is_no_data());
}

#[tokio::test]
async fn range_limit_is_enforced_before_store_access() {
    let svc = AnalyticsService::new(Arc::new(InMemoryOrderStore::new()), policy());
    let today = date(2026, 1, 15);

    let exact = AnalyticsQuery::new(date(2024, 12, 31), date(2025, 12, 31), GroupBy::Month);
    assert!(svc.compute_as_of(&exact, today).await.is_ok());

    let over = AnalyticsQuery::new(date(2024, 12, 30), date(2025, 12, 31), GroupBy::Month);
    let err = svc.compute_as_of(&over, today).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RangeExceeded);
    assert_eq!(err.code_name(), "RANGE_EXCEEDED");
}

#[tokio::test]
async fn csv_cross_product_and_escaping() {
    let response = compute(&query()).await.into_response();
    let export = CsvExport::new(response, Column::DEFAULT.to_vec());
    // 2 revenue periods (December also has a cancellation) x 3 products
    assert_eq!(export.row_count(), 6);

    let csv = String::from_utf8(export.into_bytes()).unwrap();
    assert!(csv.starts_with(BOM));
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.contains("\"Pizza \"\"Especial\"\"; con jamón\""));

    let header = csv.trim_start_matches(BOM).lines().next().unwrap();
    assert_eq!(
        header,
        "\"period\";\"orderCount\";\"revenue\";\"cancelledCount\";\"lostRevenue\";\
         \"productKey\";\"productName\";\"quantitySold\";\"productRevenue\";\"avgPrepTime\""
    );
    assert!(!csv.contains("null"));
}

#[tokio::test]
async fn csv_no_data_placeholder() {
    let q = AnalyticsQuery::new(date(2025, 1, 1), date(2025, 1, 31), GroupBy::Month);
    let outcome = compute(&q).await;
    let csv = String::from_utf8(
        CsvExport::new(outcome.into_response(), vec![Column::Period, Column::Revenue])
            .into_bytes(),
    )
    .unwrap();
    assert_eq!(
        csv,
        format!("{BOM}\"period\";\"revenue\"\n\"{NO_DATA_MESSAGE}\";\"\"\n")
    );
}
