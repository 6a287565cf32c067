//! 定时审计调度器
//!
//! 启动后立即审计一次，之后按 `AUDIT_INTERVAL_SECS` 周期执行。
//! 审计窗口为最近 `AUDIT_WINDOW_DAYS` 天，按日分桶。

use chrono::{Duration, NaiveDate};
use shared::analytics::{AnalyticsQuery, GroupBy};
use shared::audit::AuditReport;
use tokio_util::sync::CancellationToken;

use super::service::ConsistencyAuditor;
use crate::core::config::AuditPolicy;
use crate::utils::AppResult;
use crate::utils::time;

/// 定时审计调度器
///
/// 注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动。
pub struct AuditScheduler {
    auditor: ConsistencyAuditor,
    policy: AuditPolicy,
    shutdown: CancellationToken,
}

impl AuditScheduler {
    pub fn new(
        auditor: ConsistencyAuditor,
        policy: AuditPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            auditor,
            policy,
            shutdown,
        }
    }

    /// `[today - days, today]`，按日分桶
    pub fn trailing_query(today: NaiveDate, days: u32) -> AnalyticsQuery {
        let from = today - Duration::days(i64::from(days));
        AnalyticsQuery::new(from, today, GroupBy::Day)
    }

    /// 主循环：立即执行一次 → 周期触发
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.policy.interval.as_secs(),
            window_days = self.policy.window_days,
            "Audit scheduler started"
        );

        loop {
            if let Err(e) = self.run_once(time::today_utc()).await {
                tracing::error!(target: "audit", error = %e, "Scheduled audit failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Audit scheduler received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Audit scheduler stopped");
    }

    /// 审计截至 `today` 的回溯窗口，并记录结果摘要
    pub async fn run_once(&self, today: NaiveDate) -> AppResult<AuditReport> {
        let query = Self::trailing_query(today, self.policy.window_days);
        let report = self.auditor.audit_as_of(&query, today).await?;

        if report.is_valid {
            tracing::info!(
                target: "audit",
                from = %query.from,
                to = %query.to,
                discrepancies = report.discrepancies.len(),
                "Scheduled audit passed"
            );
        } else {
            tracing::warn!(
                target: "audit",
                from = %query.from,
                to = %query.to,
                discrepancies = report.discrepancies.len(),
                "Scheduled audit failed: reported analytics drifted from raw orders"
            );
        }
        Ok(report)
    }
}
