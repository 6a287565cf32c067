//! API 路由模块
//!
//! # 结构
//!
//! - [`analytics`] - 统计查询、CSV 导出、一致性审计
//! - [`health`] - 健康检查

pub mod analytics;
pub mod health;

use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(analytics::router())
        .merge(health::router())
}

/// Build a fully configured application with middleware and state
///
/// Used by both the HTTP server and oneshot tests
pub fn build_app(state: ServerState) -> Router {
    let max_connections = state.config.max_connections;
    build_router()
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // 聚合查询可能扫描大范围数据，限制并发
        .layer(ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}
