//! Order store interface

use async_trait::async_trait;
use shared::error::AppError;
use shared::models::{OrderRecord, OrderStatus};
use thiserror::Error;

use crate::analytics::pipeline::{AggregateRow, AggregationPipeline};
use crate::utils::time::TimeWindow;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::database(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only order query capability
///
/// `window` bounds are inclusive on `created_at`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders created inside `window` whose status is in `statuses`
    async fn find_orders(
        &self,
        window: TimeWindow,
        statuses: &[OrderStatus],
    ) -> StoreResult<Vec<OrderRecord>>;

    /// Number of orders created inside `window` whose status is in `statuses`
    async fn count_orders(&self, window: TimeWindow, statuses: &[OrderStatus])
    -> StoreResult<u64>;

    /// Execute an aggregation pipeline
    async fn aggregate(&self, pipeline: &AggregationPipeline) -> StoreResult<Vec<AggregateRow>>;

    /// Write path (seeding, tests)
    async fn insert(&self, order: OrderRecord) -> StoreResult<()>;
}
