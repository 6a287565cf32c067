//! Aggregation pipeline builder
//!
//! A pipeline is an ordered list of stages executed by an [`OrderStore`]
//! backend. Backends either interpret the stages directly (in-memory) or
//! compile them into a database query (SurrealDB).
//!
//! Canonical stage order:
//!
//! ```text
//! Match → UnwindItems → Project → Group → Sort → Limit?
//! ```
//!
//! [`OrderStore`]: crate::db::OrderStore

use serde::{Deserialize, Serialize};
use shared::models::OrderStatus;
use thiserror::Error;

use super::period::PeriodStrategy;
use crate::utils::time::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Pipeline must start with a match stage")]
    MissingMatch,
    #[error("Pipeline has no group stage")]
    MissingGroup,
    #[error("Stage {stage} is out of order")]
    OutOfOrder { stage: &'static str },
    #[error("Grouping by period requires a period projection")]
    MissingPeriod,
    #[error("Match stage has no statuses")]
    EmptyStatusSet,
}

/// Grouping key for the group stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKey {
    /// Period bucket from the projection; yields distinct order count + revenue
    Period,
    /// Product identity; yields quantity + revenue
    Product,
}

/// Sort order for grouped rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    KeyAsc,
    QuantityDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep orders created inside `window` with a status in `statuses`
    Match {
        window: TimeWindow,
        statuses: Vec<OrderStatus>,
    },
    /// One row per line item
    UnwindItems,
    /// Tag each row with its extended price and, optionally, its period bucket
    Project { period: Option<PeriodStrategy> },
    Group(GroupKey),
    Sort(SortOrder),
    Limit(usize),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Match { .. } => "match",
            Stage::UnwindItems => "unwind",
            Stage::Project { .. } => "project",
            Stage::Group(_) => "group",
            Stage::Sort(_) => "sort",
            Stage::Limit(_) => "limit",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Stage::Match { .. } => 0,
            Stage::UnwindItems => 1,
            Stage::Project { .. } => 2,
            Stage::Group(_) => 3,
            Stage::Sort(_) => 4,
            Stage::Limit(_) => 5,
        }
    }
}

/// One grouped output row
///
/// Period groups fill `order_count`; product groups fill `label` and
/// `quantity`. Both fill `total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub order_count: u64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub total: f64,
}

/// Validated, immutable stage list
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationPipeline {
    stages: Vec<Stage>,
}

impl AggregationPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Match stage parameters
    pub fn match_stage(&self) -> Option<(&TimeWindow, &[OrderStatus])> {
        match self.stages.first() {
            Some(Stage::Match { window, statuses }) => Some((window, statuses.as_slice())),
            _ => None,
        }
    }

    pub fn period(&self) -> Option<PeriodStrategy> {
        self.stages.iter().find_map(|s| match s {
            Stage::Project { period } => *period,
            _ => None,
        })
    }

    pub fn group_key(&self) -> GroupKey {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Group(key) => Some(*key),
                _ => None,
            })
            .unwrap_or(GroupKey::Period)
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.stages.iter().find_map(|s| match s {
            Stage::Sort(order) => Some(*order),
            _ => None,
        })
    }

    pub fn limit(&self) -> Option<usize> {
        self.stages.iter().find_map(|s| match s {
            Stage::Limit(n) => Some(*n),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn match_orders(mut self, window: TimeWindow, statuses: &[OrderStatus]) -> Self {
        self.stages.push(Stage::Match {
            window,
            statuses: statuses.to_vec(),
        });
        self
    }

    pub fn unwind_items(mut self) -> Self {
        self.stages.push(Stage::UnwindItems);
        self
    }

    pub fn project(mut self, period: Option<PeriodStrategy>) -> Self {
        self.stages.push(Stage::Project { period });
        self
    }

    pub fn group_by(mut self, key: GroupKey) -> Self {
        self.stages.push(Stage::Group(key));
        self
    }

    pub fn sort(mut self, order: SortOrder) -> Self {
        self.stages.push(Stage::Sort(order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    pub fn build(self) -> Result<AggregationPipeline, PipelineError> {
        match self.stages.first() {
            Some(Stage::Match { statuses, .. }) if statuses.is_empty() => {
                return Err(PipelineError::EmptyStatusSet);
            }
            Some(Stage::Match { .. }) => {}
            _ => return Err(PipelineError::MissingMatch),
        }

        for pair in self.stages.windows(2) {
            if pair[1].rank() <= pair[0].rank() {
                return Err(PipelineError::OutOfOrder {
                    stage: pair[1].name(),
                });
            }
        }

        let pipeline = AggregationPipeline {
            stages: self.stages,
        };
        if !pipeline
            .stages
            .iter()
            .any(|s| matches!(s, Stage::Group(_)))
        {
            return Err(PipelineError::MissingGroup);
        }
        if pipeline.group_key() == GroupKey::Period && pipeline.period().is_none() {
            return Err(PipelineError::MissingPeriod);
        }
        Ok(pipeline)
    }
}

/// Time series pass: per-period distinct orders and revenue, ascending
pub fn series_pipeline(
    window: TimeWindow,
    statuses: &[OrderStatus],
    strategy: PeriodStrategy,
) -> Result<AggregationPipeline, PipelineError> {
    AggregationPipeline::builder()
        .match_orders(window, statuses)
        .unwind_items()
        .project(Some(strategy))
        .group_by(GroupKey::Period)
        .sort(SortOrder::KeyAsc)
        .build()
}

/// Leaderboard pass: per-product quantity and revenue, top `top` by quantity
pub fn product_pipeline(
    window: TimeWindow,
    statuses: &[OrderStatus],
    top: usize,
) -> Result<AggregationPipeline, PipelineError> {
    AggregationPipeline::builder()
        .match_orders(window, statuses)
        .unwind_items()
        .project(None)
        .group_by(GroupKey::Product)
        .sort(SortOrder::QuantityDesc)
        .limit(top)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> TimeWindow {
        TimeWindow { start: 0, end: 1000 }
    }

    #[test]
    fn test_series_pipeline_shape() {
        let p = series_pipeline(window(), OrderStatus::REVENUE, PeriodStrategy::Month).unwrap();
        assert_eq!(p.stages().len(), 5);
        assert_eq!(p.period(), Some(PeriodStrategy::Month));
        assert_eq!(p.group_key(), GroupKey::Period);
        assert_eq!(p.sort(), Some(SortOrder::KeyAsc));
        assert_eq!(p.limit(), None);
        let (w, statuses) = p.match_stage().unwrap();
        assert_eq!(*w, window());
        assert_eq!(statuses, OrderStatus::REVENUE);
    }

    #[test]
    fn test_product_pipeline_shape() {
        let p = product_pipeline(window(), OrderStatus::REVENUE, 3).unwrap();
        assert_eq!(p.group_key(), GroupKey::Product);
        assert_eq!(p.sort(), Some(SortOrder::QuantityDesc));
        assert_eq!(p.limit(), Some(3));
        assert_eq!(p.period(), None);
    }

    #[test]
    fn test_build_rejects_missing_match() {
        let err = AggregationPipeline::builder()
            .unwind_items()
            .group_by(GroupKey::Product)
            .build()
            .unwrap_err();
        assert_eq!(err, PipelineError::MissingMatch);
    }

    #[test]
    fn test_build_rejects_out_of_order() {
        let err = AggregationPipeline::builder()
            .match_orders(window(), OrderStatus::CANCELLED)
            .group_by(GroupKey::Product)
            .unwind_items()
            .build()
            .unwrap_err();
        assert_eq!(err, PipelineError::OutOfOrder { stage: "unwind" });
    }

    #[test]
    fn test_build_rejects_period_group_without_projection() {
        let err = AggregationPipeline::builder()
            .match_orders(window(), OrderStatus::CANCELLED)
            .unwind_items()
            .project(None)
            .group_by(GroupKey::Period)
            .build()
            .unwrap_err();
        assert_eq!(err, PipelineError::MissingPeriod);
    }

    #[test]
    fn test_build_rejects_empty_statuses() {
        let err = AggregationPipeline::builder()
            .match_orders(window(), &[])
            .unwind_items()
            .project(None)
            .group_by(GroupKey::Product)
            .build()
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyStatusSet);
    }

    #[test]
    fn test_build_rejects_missing_group() {
        let err = AggregationPipeline::builder()
            .match_orders(window(), OrderStatus::CANCELLED)
            .unwind_items()
            .build()
            .unwrap_err();
        assert_eq!(err, PipelineError::MissingGroup);
    }
}
