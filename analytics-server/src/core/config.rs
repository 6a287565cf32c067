use std::path::PathBuf;
use std::time::Duration;

/// 统计查询策略
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsPolicy {
    /// 查询跨度上限 (自然月)
    pub max_range_months: u32,
    /// 未指定 `top` 时的排行榜长度
    pub default_top: u32,
}

impl Default for AnalyticsPolicy {
    fn default() -> Self {
        Self {
            max_range_months: 120,
            default_top: shared::analytics::DEFAULT_TOP,
        }
    }
}

/// 一致性审计策略
#[derive(Debug, Clone, PartialEq)]
pub struct AuditPolicy {
    /// 金额偏差容忍度 (百分比)，超过即判定审计失败
    pub tolerance_percent: f64,
    /// 是否启用定时审计
    pub schedule_enabled: bool,
    /// 定时审计回溯天数
    pub window_days: u32,
    /// 定时审计间隔
    pub interval: Duration,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            tolerance_percent: 1.0,
            schedule_enabled: true,
            window_days: 30,
            interval: Duration::from_secs(86_400),
        }
    }
}

/// 订单存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// 进程内存储 (测试、演示)
    Memory,
    /// 嵌入式 SurrealDB (RocksDB 文件)
    Surreal,
}

impl StoreBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "surreal" | "surrealdb" => Self::Surreal,
            _ => Self::Memory,
        }
    }
}

/// 服务器配置 - 统计服务的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | MAX_CONNECTIONS | 1000 | 最大并发请求数 |
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | ANALYTICS_MAX_RANGE_MONTHS | 120 | 查询跨度上限 |
/// | ANALYTICS_DEFAULT_TOP | 10 | 默认排行榜长度 |
/// | AUDIT_TOLERANCE_PERCENT | 1.0 | 审计容忍度 |
/// | AUDIT_SCHEDULE_ENABLED | true | 定时审计开关 |
/// | AUDIT_WINDOW_DAYS | 30 | 定时审计回溯天数 |
/// | AUDIT_INTERVAL_SECS | 86400 | 定时审计间隔 |
/// | STORE_BACKEND | memory | memory / surreal |
/// | SEED_ORDERS_FILE | - | 启动时导入的订单 JSON 数组 |
///
/// # 示例
///
/// ```ignore
/// STORE_BACKEND=surreal HTTP_PORT=8080 cargo run -p analytics-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 最大并发请求数
    pub max_connections: usize,
    /// 工作目录
    pub work_dir: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub store_backend: StoreBackend,
    /// 启动时导入的订单文件 (JSON 数组)
    pub seed_orders_file: Option<String>,
    pub analytics: AnalyticsPolicy,
    pub audit: AuditPolicy,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let analytics_defaults = AnalyticsPolicy::default();
        let audit_defaults = AuditPolicy::default();
        Self {
            http_port: env_parse("HTTP_PORT", 3000),
            max_connections: env_parse("MAX_CONNECTIONS", 1000usize).max(1),
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            store_backend: std::env::var("STORE_BACKEND")
                .map(|v| StoreBackend::parse(&v))
                .unwrap_or(StoreBackend::Memory),
            seed_orders_file: std::env::var("SEED_ORDERS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            analytics: AnalyticsPolicy {
                max_range_months: env_parse(
                    "ANALYTICS_MAX_RANGE_MONTHS",
                    analytics_defaults.max_range_months,
                ),
                default_top: env_parse("ANALYTICS_DEFAULT_TOP", analytics_defaults.default_top)
                    .max(1),
            },
            audit: AuditPolicy {
                tolerance_percent: env_parse(
                    "AUDIT_TOLERANCE_PERCENT",
                    audit_defaults.tolerance_percent,
                ),
                schedule_enabled: env_parse(
                    "AUDIT_SCHEDULE_ENABLED",
                    audit_defaults.schedule_enabled,
                ),
                window_days: env_parse("AUDIT_WINDOW_DAYS", audit_defaults.window_days),
                interval: Duration::from_secs(
                    env_parse("AUDIT_INTERVAL_SECS", audit_defaults.interval.as_secs()).max(1),
                ),
            },
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// SurrealDB 数据目录
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
