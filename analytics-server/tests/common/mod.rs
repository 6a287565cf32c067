#![allow(dead_code)]

use std::sync::Arc;

use analytics_server::InMemoryOrderStore;
use analytics_server::core::config::AnalyticsPolicy;
use analytics_server::utils::time::day_start_millis;
use chrono::NaiveDate;
use shared::models::{OrderLineItem, OrderRecord, OrderStatus};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Noon UTC on the given day
pub fn at(y: i32, m: u32, d: u32) -> i64 {
    day_start_millis(date(y, m, d)) + 12 * 3_600_000
}

pub fn policy() -> AnalyticsPolicy {
    AnalyticsPolicy {
        max_range_months: 12,
        default_top: 10,
    }
}

/// November: two fulfilled orders totalling 40. December: one fulfilled
/// order of 18, one cancelled order of 7.50 and a pending order.
pub fn sample_orders() -> Vec<OrderRecord> {
    vec![
        OrderRecord::new(
            "o1",
            at(2025, 11, 3),
            OrderStatus::Delivered,
            vec![
                OrderLineItem::new("pizza", "Pizza \"Especial\"; con jamón", 1, 12.0),
                OrderLineItem::new("soda", "Soda", 2, 4.0),
            ],
        ),
        OrderRecord::new(
            "o2",
            at(2025, 11, 20),
            OrderStatus::Completed,
            vec![OrderLineItem::new("soda", "Soda", 5, 4.0)],
        ),
        OrderRecord::new(
            "o3",
            at(2025, 12, 5),
            OrderStatus::Ready,
            vec![OrderLineItem::new("pasta", "Pasta", 1, 18.0)],
        ),
        OrderRecord::new(
            "o4",
            at(2025, 12, 9),
            OrderStatus::Cancelled,
            vec![OrderLineItem::new("salad", "Salad", 1, 7.5)],
        ),
        OrderRecord::new(
            "o5",
            at(2025, 12, 10),
            OrderStatus::Pending,
            vec![OrderLineItem::new("pizza", "Pizza", 10, 12.0)],
        ),
    ]
}

pub fn sample_store() -> Arc<InMemoryOrderStore> {
    Arc::new(InMemoryOrderStore::with_orders(sample_orders()))
}
