//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - [`time`] - 查询窗口与时间戳转换
//! - [`money`] - 金额精度处理
//! - 日志初始化

pub mod logger;
pub mod money;
pub mod time;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
