//! 统计分析模块
//!
//! - [`period`] - 时间分桶策略
//! - [`pipeline`] - 聚合管道构建
//! - [`service`] - 查询编排 (校验 → 聚合 → 整形)
//! - [`shaper`] - 响应整形与金额舍入
//! - [`csv_export`] - CSV 流式导出

pub mod csv_export;
pub mod period;
pub mod pipeline;
pub mod service;
pub mod shaper;

pub use csv_export::{Column, CsvExport};
pub use period::PeriodStrategy;
pub use service::{AnalyticsOutcome, AnalyticsService};
