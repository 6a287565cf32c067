//! Analytics API 模块 (统计、导出、审计)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/analytics | GET | 统计结果，无数据时 204 |
//! | /api/analytics/export | GET | CSV 流式导出 |
//! | /api/analytics/audit | GET | 一致性审计 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub use handler::ExportQuery;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_analytics))
        .route("/export", get(handler::export_csv))
        .route("/audit", get(handler::audit))
}
