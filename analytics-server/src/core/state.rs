use std::sync::Arc;

use parking_lot::RwLock;
use shared::audit::AuditAlert;
use shared::models::OrderRecord;
use tokio::sync::broadcast::error::RecvError;

use crate::analytics::AnalyticsService;
use crate::audit::{
    AlertSink, AuditScheduler, BroadcastAlertSink, ConsistencyAuditor, FanoutAlertSink,
    TracingAlertSink,
};
use crate::core::config::{Config, StoreBackend};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::{InMemoryOrderStore, OrderStore, SurrealOrderStore};
use crate::utils::{AppError, AppResult};

/// 告警通道容量
const ALERT_CHANNEL_CAPACITY: usize = 64;

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | Arc<dyn OrderStore> | 订单存储 |
/// | analytics | AnalyticsService | 统计编排 |
/// | auditor | ConsistencyAuditor | 一致性审计 |
/// | alerts | BroadcastAlertSink | 审计告警广播 |
/// | last_alert | Arc<RwLock<Option<AuditAlert>>> | 最近一次告警 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn OrderStore>,
    pub analytics: AnalyticsService,
    pub auditor: ConsistencyAuditor,
    pub alerts: BroadcastAlertSink,
    pub last_alert: Arc<RwLock<Option<AuditAlert>>>,
}

impl ServerState {
    /// 用给定存储构造状态
    pub fn new(config: Config, store: Arc<dyn OrderStore>) -> Self {
        let analytics = AnalyticsService::new(store.clone(), config.analytics.clone());
        let alerts = BroadcastAlertSink::new(ALERT_CHANNEL_CAPACITY);
        let sink: Arc<dyn AlertSink> = Arc::new(
            FanoutAlertSink::new()
                .with(Arc::new(TracingAlertSink))
                .with(Arc::new(alerts.clone())),
        );
        let auditor = ConsistencyAuditor::new(
            store.clone(),
            analytics.clone(),
            sink,
            config.audit.tolerance_percent,
        );
        Self {
            config,
            store,
            analytics,
            auditor,
            alerts,
            last_alert: Arc::new(RwLock::new(None)),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按 `STORE_BACKEND` 打开订单存储
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let store: Arc<dyn OrderStore> = match config.store_backend {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory order store");
                Arc::new(InMemoryOrderStore::new())
            }
            StoreBackend::Surreal => {
                let dir = config.database_dir();
                std::fs::create_dir_all(&dir).map_err(|e| {
                    AppError::config(format!(
                        "Failed to create database dir {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                tracing::info!(path = %dir.display(), "Opening SurrealDB order store");
                Arc::new(SurrealOrderStore::open(&dir).await?)
            }
        };
        if let Some(path) = &config.seed_orders_file {
            seed_orders(store.as_ref(), path).await?;
        }
        Ok(Self::new(config.clone(), store))
    }

    /// 启动后台任务
    ///
    /// - 告警监听：记录最近一次告警，供 `/health` 返回
    /// - 定时审计 (AUDIT_SCHEDULE_ENABLED)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let mut rx = self.alerts.subscribe();
        let last_alert = self.last_alert.clone();
        let shutdown = tasks.shutdown_token();
        tasks.spawn("audit_alert_listener", TaskKind::Listener, async move {
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Ok(alert) => *last_alert.write() = Some(alert),
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(target: "audit", skipped = n, "Alert listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = shutdown.cancelled() => break,
                }
            }
        });

        if self.config.audit.schedule_enabled {
            let scheduler = AuditScheduler::new(
                self.auditor.clone(),
                self.config.audit.clone(),
                tasks.shutdown_token(),
            );
            tasks.spawn("audit_scheduler", TaskKind::Periodic, scheduler.run());
        } else {
            tracing::info!("Scheduled audit disabled");
        }

        tracing::info!("Background tasks registered: {}", tasks.len());
        tasks
    }

    /// 最近一次告警时间 (Unix millis)
    pub fn last_alert_at(&self) -> Option<i64> {
        self.last_alert.read().as_ref().map(|a| a.raised_at)
    }
}

/// 导入订单种子数据
async fn seed_orders(store: &dyn OrderStore, path: &str) -> AppResult<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::config(format!("Failed to read seed file {}: {}", path, e)))?;
    let orders: Vec<OrderRecord> = serde_json::from_str(&raw)
        .map_err(|e| AppError::config(format!("Invalid seed file {}: {}", path, e)))?;
    let count = orders.len();
    for order in orders {
        store.insert(order).await?;
    }
    tracing::info!(path = %path, count, "Seeded orders");
    Ok(())
}
