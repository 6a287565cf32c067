//! Response shaper
//!
//! Pure conversion from raw pipeline rows to [`AnalyticsResponse`]. Every
//! monetary value is rounded half away from zero to two decimals, once per
//! series point and once on the summary.

use shared::analytics::{
    AnalyticsQuery, AnalyticsResponse, CancelledSeriesPoint, DateRangeView, ProductAggregate,
    SeriesPoint, Summary,
};

use super::pipeline::AggregateRow;
use super::service::RawAggregates;
use crate::utils::money;

pub fn shape(query: &AnalyticsQuery, raw: RawAggregates) -> AnalyticsResponse {
    let series: Vec<SeriesPoint> = raw
        .series
        .into_iter()
        .map(|row| SeriesPoint {
            period: row.key,
            order_count: row.order_count,
            revenue: money::round_money(row.total),
        })
        .collect();

    let cancelled_series: Vec<CancelledSeriesPoint> = raw
        .cancelled
        .into_iter()
        .map(|row| CancelledSeriesPoint {
            period: row.key,
            cancelled_count: row.order_count,
            lost_revenue: money::round_money(row.total),
        })
        .collect();

    let products_sold: Vec<ProductAggregate> =
        raw.products.into_iter().map(product_from_row).collect();

    let summary = Summary {
        order_count: series.iter().map(|p| p.order_count).sum(),
        revenue: money::sum_money(series.iter().map(|p| p.revenue)),
        cancelled_count: cancelled_series.iter().map(|p| p.cancelled_count).sum(),
        lost_revenue: money::sum_money(cancelled_series.iter().map(|p| p.lost_revenue)),
        // 尚无备餐时间埋点
        avg_prep_time: None,
    };

    AnalyticsResponse {
        range: DateRangeView {
            from: query.from,
            to: query.to,
            group_by: query.group_by,
        },
        summary,
        series,
        cancelled_series,
        // Truncated upstream; the top-N view is the same list
        top_n_products: products_sold.clone(),
        products_sold,
        message: format!(
            "Analytics from {} to {} grouped by {}",
            query.from, query.to, query.group_by
        ),
    }
}

fn product_from_row(row: AggregateRow) -> ProductAggregate {
    ProductAggregate {
        name: row.label.unwrap_or_else(|| row.key.clone()),
        product_key: row.key,
        quantity_sold: row.quantity,
        revenue: money::round_money(row.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::analytics::GroupBy;

    fn query() -> AnalyticsQuery {
        AnalyticsQuery::new(
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            GroupBy::Month,
        )
    }

    fn period(key: &str, orders: u64, total: f64) -> AggregateRow {
        AggregateRow {
            key: key.to_string(),
            label: None,
            order_count: orders,
            quantity: 0,
            total,
        }
    }

    #[test]
    fn test_summary_sums_rounded_points() {
        let raw = RawAggregates {
            series: vec![period("2025-11", 2, 0.1 + 0.2), period("2025-12", 1, 10.006)],
            cancelled: vec![period("2025-12", 1, 3.333)],
            products: vec![],
        };
        let response = shape(&query(), raw);
        assert_eq!(response.series[0].revenue, 0.3);
        assert_eq!(response.series[1].revenue, 10.01);
        assert_eq!(response.summary.order_count, 3);
        assert_eq!(response.summary.revenue, 10.31);
        assert_eq!(response.summary.cancelled_count, 1);
        assert_eq!(response.summary.lost_revenue, 3.33);
        assert_eq!(response.summary.avg_prep_time, None);
    }

    #[test]
    fn test_top_n_is_copy_of_products() {
        let raw = RawAggregates {
            series: vec![period("2025-11", 1, 20.0)],
            cancelled: vec![],
            products: vec![
                AggregateRow {
                    key: "p1".into(),
                    label: Some("Pizza".into()),
                    order_count: 0,
                    quantity: 2,
                    total: 20.0,
                },
                AggregateRow {
                    key: "p2".into(),
                    label: None,
                    order_count: 0,
                    quantity: 1,
                    total: 0.0,
                },
            ],
        };
        let response = shape(&query(), raw);
        assert_eq!(response.top_n_products, response.products_sold);
        assert_eq!(response.products_sold[0].name, "Pizza");
        // Missing label falls back to the key
        assert_eq!(response.products_sold[1].name, "p2");
    }

    #[test]
    fn test_range_echoes_query() {
        let response = shape(&query(), RawAggregates::default());
        assert_eq!(response.range.group_by, GroupBy::Month);
        assert_eq!(response.range.from, query().from);
        assert!(response.series.is_empty());
        assert_eq!(response.summary.revenue, 0.0);
    }
}
