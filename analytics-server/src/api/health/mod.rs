//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/analytics/health | GET | 健康检查 |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::{ServerState, StoreBackend};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/analytics/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    store: &'static str,
    audit_scheduled: bool,
    /// 最近一次 CRITICAL 告警 (Unix millis)
    last_alert_at: Option<i64>,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: match state.config.store_backend {
            StoreBackend::Memory => "memory",
            StoreBackend::Surreal => "surreal",
        },
        audit_scheduled: state.config.audit.schedule_enabled,
        last_alert_at: state.last_alert_at(),
    })
}
