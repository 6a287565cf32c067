//! In-memory order store
//!
//! Interprets [`AggregationPipeline`] stages directly over a `Vec` of
//! orders. Used by tests and by `STORE_BACKEND=memory`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::models::{OrderLineItem, OrderRecord, OrderStatus};

use super::store::{OrderStore, StoreError, StoreResult};
use crate::analytics::pipeline::{AggregateRow, AggregationPipeline, GroupKey, SortOrder};
use crate::utils::money;
use crate::utils::time::TimeWindow;

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<OrderRecord>>,
}

/// One unwound line item after projection
struct ProjectedRow<'a> {
    order_id: &'a str,
    period: Option<String>,
    item: &'a OrderLineItem,
    extended: Decimal,
}

/// Running totals for one group
#[derive(Default)]
struct Accumulator<'a> {
    label: Option<&'a str>,
    orders: HashSet<&'a str>,
    quantity: i64,
    total: Decimal,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<OrderRecord>) -> Self {
        Self {
            orders: RwLock::new(orders),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    fn matching<'a>(
        orders: &'a [OrderRecord],
        window: TimeWindow,
        statuses: &'a [OrderStatus],
    ) -> impl Iterator<Item = &'a OrderRecord> + 'a {
        orders
            .iter()
            .filter(move |o| window.contains(o.created_at) && statuses.contains(&o.status))
    }

    fn run(
        orders: &[OrderRecord],
        pipeline: &AggregationPipeline,
    ) -> StoreResult<Vec<AggregateRow>> {
        let (window, statuses) = pipeline
            .match_stage()
            .ok_or_else(|| StoreError::InvalidPipeline("missing match stage".to_string()))?;
        let period = pipeline.period();
        let group_key = pipeline.group_key();

        let mut projected = Vec::new();
        for order in Self::matching(orders, *window, statuses) {
            let bucket = match period {
                Some(strategy) => match strategy.format_millis(order.created_at) {
                    Some(key) => Some(key),
                    None => {
                        tracing::warn!(
                            order_id = %order.id,
                            created_at = order.created_at,
                            "Skipping order with unrepresentable timestamp"
                        );
                        continue;
                    }
                },
                None => None,
            };
            // 无明细的订单在展开后消失
            for item in &order.items {
                projected.push(ProjectedRow {
                    order_id: &order.id,
                    period: bucket.clone(),
                    item,
                    extended: money::to_decimal(item.line_total()),
                });
            }
        }

        let mut groups: BTreeMap<String, Accumulator<'_>> = BTreeMap::new();
        for row in &projected {
            let key = match group_key {
                GroupKey::Period => row.period.clone().ok_or_else(|| {
                    StoreError::InvalidPipeline("period group without projection".to_string())
                })?,
                GroupKey::Product => row.item.product_id.clone(),
            };
            let acc = groups.entry(key).or_default();
            acc.label.get_or_insert(row.item.name.as_str());
            acc.orders.insert(row.order_id);
            acc.quantity += i64::from(row.item.quantity);
            acc.total += row.extended;
        }

        let mut rows: Vec<AggregateRow> = groups
            .into_iter()
            .map(|(key, acc)| {
                let (label, order_count, quantity) = match group_key {
                    GroupKey::Period => (None, acc.orders.len() as u64, acc.quantity),
                    GroupKey::Product => (acc.label.map(str::to_string), 0, acc.quantity),
                };
                AggregateRow {
                    key,
                    label,
                    order_count,
                    quantity,
                    total: money::to_f64(acc.total),
                }
            })
            .collect();

        match pipeline.sort() {
            // BTreeMap already yields keys ascending
            Some(SortOrder::KeyAsc) | None => {}
            Some(SortOrder::QuantityDesc) => {
                rows.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.key.cmp(&b.key)));
            }
        }
        if let Some(limit) = pipeline.limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_orders(
        &self,
        window: TimeWindow,
        statuses: &[OrderStatus],
    ) -> StoreResult<Vec<OrderRecord>> {
        let orders = self.orders.read();
        Ok(Self::matching(&orders, window, statuses).cloned().collect())
    }

    async fn count_orders(
        &self,
        window: TimeWindow,
        statuses: &[OrderStatus],
    ) -> StoreResult<u64> {
        let orders = self.orders.read();
        Ok(Self::matching(&orders, window, statuses).count() as u64)
    }

    async fn aggregate(&self, pipeline: &AggregationPipeline) -> StoreResult<Vec<AggregateRow>> {
        let orders = self.orders.read();
        Self::run(&orders, pipeline)
    }

    async fn insert(&self, order: OrderRecord) -> StoreResult<()> {
        self.orders.write().push(order);
        Ok(())
    }
}
