//! SurrealDB order store
//!
//! Orders live in the `order` table keyed by their id. Pipelines are
//! compiled into one SurrealQL statement: the inner select unwinds line
//! items with `SPLIT items` and projects the bucket key; the outer select
//! groups and sorts.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{OrderLineItem, OrderRecord, OrderStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use super::store::{OrderStore, StoreError, StoreResult};
use crate::analytics::pipeline::{AggregateRow, AggregationPipeline, GroupKey, SortOrder};
use crate::utils::time::TimeWindow;

const NAMESPACE: &str = "analytics";
const DATABASE: &str = "orders";

/// Row shape in the `order` table
#[derive(Debug, Serialize, Deserialize)]
struct StoredOrder {
    order_id: String,
    created_at: i64,
    status: OrderStatus,
    items: Vec<OrderLineItem>,
    total_amount: f64,
}

impl From<OrderRecord> for StoredOrder {
    fn from(order: OrderRecord) -> Self {
        Self {
            order_id: order.id,
            created_at: order.created_at,
            status: order.status,
            items: order.items,
            total_amount: order.total_amount,
        }
    }
}

impl From<StoredOrder> for OrderRecord {
    fn from(row: StoredOrder) -> Self {
        Self {
            id: row.order_id,
            created_at: row.created_at,
            status: row.status,
            items: row.items,
            total_amount: row.total_amount,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

const MATCH_CLAUSE: &str =
    "created_at >= $start AND created_at <= $end AND status IN $statuses";

#[derive(Clone)]
pub struct SurrealOrderStore {
    db: Surreal<Db>,
}

impl SurrealOrderStore {
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(path.as_ref()).await?;
        Self::init(db).await
    }

    /// Ephemeral in-process database
    pub async fn open_memory() -> StoreResult<Self> {
        let db: Surreal<Db> = Surreal::new::<Mem>(()).await?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> StoreResult<Self> {
        db.use_ns(NAMESPACE).use_db(DATABASE).await?;
        db.query("DEFINE INDEX IF NOT EXISTS order_created_at ON order FIELDS created_at")
            .await?
            .check()?;
        tracing::info!(namespace = NAMESPACE, database = DATABASE, "Order store ready");
        Ok(Self { db })
    }

    fn status_tags(statuses: &[OrderStatus]) -> Vec<String> {
        statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}

/// Statement index of the grouped rows in a compiled aggregation
pub const AGGREGATE_RESULT: usize = 2;

/// Compile a pipeline into a SurrealQL script
///
/// Three statements: `$unwound` (match + `SPLIT items`), `$rows` (bucket and
/// line total per item), then the grouped select at [`AGGREGATE_RESULT`].
/// `SPLIT` requires the split field itself in the selection, so projection
/// happens one level up.
///
/// `LIMIT` is not emitted; callers truncate after fetching. The embedded
/// engine has dropped leading rows on `ORDER BY .. LIMIT` with a `WHERE`.
pub fn compile_aggregate(pipeline: &AggregationPipeline) -> StoreResult<String> {
    if pipeline.match_stage().is_none() {
        return Err(StoreError::InvalidPipeline("missing match stage".to_string()));
    }

    let bucket = match pipeline.period() {
        Some(strategy) => strategy.bucket_expression("created_at"),
        None => "NONE".to_string(),
    };
    let unwound = format!(
        "LET $unwound = (SELECT order_id, created_at, items FROM order \
         WHERE {MATCH_CLAUSE} SPLIT items);"
    );
    let rows = format!(
        "LET $rows = (SELECT order_id, {bucket} AS period, items.product_id AS product_id, \
         items.name AS name, items.quantity AS quantity, \
         items.quantity * (items.unit_price ?? items.price ?? 0) AS line_total \
         FROM $unwound);"
    );

    let (projection, group) = match pipeline.group_key() {
        GroupKey::Period => (
            "period AS key, \
             array::len(array::distinct(array::group(order_id))) AS order_count, \
             math::sum(quantity) AS quantity, \
             math::sum(line_total) AS total",
            "key",
        ),
        GroupKey::Product => (
            "product_id AS key, \
             array::first(array::group(name)) AS label, \
             math::sum(quantity) AS quantity, \
             math::sum(line_total) AS total",
            "key",
        ),
    };

    let order = match pipeline.sort() {
        Some(SortOrder::KeyAsc) | None => " ORDER BY key ASC",
        Some(SortOrder::QuantityDesc) => " ORDER BY quantity DESC, key ASC",
    };

    Ok(format!(
        "{unwound} {rows} SELECT {projection} FROM $rows GROUP BY {group}{order}"
    ))
}

#[async_trait]
impl OrderStore for SurrealOrderStore {
    async fn find_orders(
        &self,
        window: TimeWindow,
        statuses: &[OrderStatus],
    ) -> StoreResult<Vec<OrderRecord>> {
        let sql = format!(
            "SELECT order_id, created_at, status, items, total_amount \
             FROM order WHERE {MATCH_CLAUSE} ORDER BY created_at ASC"
        );
        let mut result = self
            .db
            .query(sql)
            .bind(("start", window.start))
            .bind(("end", window.end))
            .bind(("statuses", Self::status_tags(statuses)))
            .await?;
        let rows: Vec<StoredOrder> = result.take(0)?;
        Ok(rows.into_iter().map(OrderRecord::from).collect())
    }

    async fn count_orders(
        &self,
        window: TimeWindow,
        statuses: &[OrderStatus],
    ) -> StoreResult<u64> {
        let sql = format!("SELECT count() AS total FROM order WHERE {MATCH_CLAUSE} GROUP ALL");
        let mut result = self
            .db
            .query(sql)
            .bind(("start", window.start))
            .bind(("end", window.end))
            .bind(("statuses", Self::status_tags(statuses)))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn aggregate(&self, pipeline: &AggregationPipeline) -> StoreResult<Vec<AggregateRow>> {
        let sql = compile_aggregate(pipeline)?;
        let (window, statuses) = pipeline
            .match_stage()
            .ok_or_else(|| StoreError::InvalidPipeline("missing match stage".to_string()))?;

        tracing::debug!(sql = %sql, "Running aggregation");
        let mut result = self
            .db
            .query(sql)
            .bind(("start", window.start))
            .bind(("end", window.end))
            .bind(("statuses", Self::status_tags(statuses)))
            .await?;
        let mut rows: Vec<AggregateRow> = result.take(AGGREGATE_RESULT)?;
        if let Some(limit) = pipeline.limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, order: OrderRecord) -> StoreResult<()> {
        let id = order.id.clone();
        self.db
            .query("UPSERT type::thing('order', $id) CONTENT $data")
            .bind(("id", id))
            .bind(("data", StoredOrder::from(order)))
            .await?
            .check()?;
        Ok(())
    }
}
