//! Analytics Server - 订单统计与一致性审计服务
//!
//! # 架构概述
//!
//! - **统计** (`analytics`): 按日/周/月/年分桶的订单数、营收、取消损失与商品排行
//! - **导出** (`analytics::csv_export`): BOM + `;` 分隔的 CSV 流
//! - **审计** (`audit`): 绕开聚合管道独立重算指标，按偏差分级并告警
//! - **存储** (`db`): 内存存储与嵌入式 SurrealDB
//! - **HTTP API** (`api`): axum 路由
//!
//! # 模块结构
//!
//! ```text
//! analytics-server/src/
//! ├── core/          # 配置、状态、后台任务、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── analytics/     # 分桶、聚合管道、编排、整形、CSV
//! ├── audit/         # 审计、告警、定时调度
//! ├── db/            # 订单存储
//! └── utils/         # 日志、时间、金额
//! ```

pub mod analytics;
pub mod api;
pub mod audit;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use analytics::{AnalyticsOutcome, AnalyticsService};
pub use audit::ConsistencyAuditor;
pub use core::{Config, Server, ServerState};
pub use db::{InMemoryOrderStore, OrderStore, SurrealOrderStore};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env、创建工作目录、初始化日志
pub fn setup_environment() -> AppResult<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    let logs_dir = config.logs_dir();
    std::fs::create_dir_all(&logs_dir).map_err(|e| {
        AppError::config(format!(
            "Failed to create logs dir {}: {}",
            logs_dir.display(),
            e
        ))
    })?;
    init_logger_with_file(
        Some(config.log_level.as_str()),
        Some(config.log_json),
        logs_dir.to_str(),
    );
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ___                __      __  _
   /   |  ____  ____ _/ /_  __/ /_(_)_________
  / /| | / __ \/ __ `/ / / / / __/ / ___/ ___/
 / ___ |/ / / / /_/ / / /_/ / /_/ / /__(__  )
/_/  |_/_/ /_/\__,_/_/\__, /\__/_/\___/____/
                     /____/
    "#
    );
}
