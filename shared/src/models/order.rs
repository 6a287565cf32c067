//! Order Model
//!
//! Read-only view of the order store as seen by analytics. Timestamps are
//! Unix millis (UTC).

use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Delivered,
    /// Legacy synonym of `Delivered`.
    ///
    /// TODO: drop once the status migration has rewritten stored COMPLETED
    /// orders to DELIVERED.
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Statuses counted toward fulfilled revenue
    pub const REVENUE: &'static [OrderStatus] = &[
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Completed,
    ];

    /// Statuses counted toward cancellation loss
    pub const CANCELLED: &'static [OrderStatus] = &[OrderStatus::Cancelled];

    pub fn is_revenue(&self) -> bool {
        Self::REVENUE.contains(self)
    }

    pub fn is_cancelled(&self) -> bool {
        Self::CANCELLED.contains(self)
    }

    /// Wire representation (matches serde)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    /// Product reference
    pub product_id: String,
    pub name: String,
    pub quantity: i32,
    /// Unit price in currency unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// Legacy price field, read when `unit_price` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderLineItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        quantity: i32,
        unit_price: f64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            unit_price: Some(unit_price),
            price: None,
        }
    }

    /// Effective unit price: `unit_price` wins over the legacy `price`
    pub fn effective_unit_price(&self) -> f64 {
        self.unit_price.or(self.price).unwrap_or(0.0)
    }

    /// `quantity × unit price`
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.effective_unit_price()
    }
}

/// Order record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub id: String,
    /// Creation time (Unix millis)
    pub created_at: i64,
    pub status: OrderStatus,
    pub items: Vec<OrderLineItem>,
    /// Total amount in currency unit
    pub total_amount: f64,
}

impl OrderRecord {
    /// Build a record whose total is the sum of its line totals
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        status: OrderStatus,
        items: Vec<OrderLineItem>,
    ) -> Self {
        let total_amount = items.iter().map(OrderLineItem::line_total).sum();
        Self {
            id: id.into(),
            created_at,
            status,
            items,
            total_amount,
        }
    }
}
