//! Analytics API Handlers

use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::analytics::{AnalyticsQuery, GroupBy};
use shared::audit::AuditResponse;
use shared::util::now_millis;

use crate::analytics::csv_export::{self, CsvExport};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Export query: analytics parameters plus a comma-separated column list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default)]
    pub top: Option<u32>,
    #[serde(default)]
    pub columns: Option<String>,
}

impl ExportQuery {
    pub fn analytics_query(&self) -> AnalyticsQuery {
        AnalyticsQuery {
            from: self.from,
            to: self.to,
            group_by: self.group_by,
            top: self.top,
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .as_deref()
            .map(|c| c.split(',').collect())
            .unwrap_or_default()
    }
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(q)| q)
        .map_err(|e| AppError::validation(e.body_text()))
}

/// GET /api/analytics - 统计结果
pub async fn get_analytics(
    State(state): State<ServerState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> AppResult<Response> {
    let query = query_params(query)?;
    match state.analytics.compute(&query).await?.into_response() {
        Some(response) => Ok(Json(response).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// GET /api/analytics/export - CSV 导出
///
/// 列名与查询参数在开始输出前校验，之后的失败只能降级为兜底行
pub async fn export_csv(
    State(state): State<ServerState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Response> {
    let params = query_params(query)?;
    let columns = csv_export::resolve_columns(params.column_names())?;
    let query = params.analytics_query();
    let outcome = state.analytics.compute(&query).await?;

    let export = CsvExport::new(outcome.into_response(), columns);
    tracing::info!(
        from = %query.from,
        to = %query.to,
        rows = export.row_count(),
        "Streaming analytics CSV"
    );

    let filename = format!("analytics_{}_{}.csv", query.from, query.to);
    let body = Body::from_stream(futures::stream::iter(export.map(Ok::<_, Infallible>)));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/analytics/audit - 一致性审计
pub async fn audit(
    State(state): State<ServerState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> AppResult<Json<AuditResponse>> {
    let query = query_params(query)?;
    let report = state.auditor.audit(&query).await?;
    if !report.is_valid {
        tracing::warn!(
            from = %query.from,
            to = %query.to,
            discrepancies = report.discrepancies.len(),
            "Audit found inconsistent analytics"
        );
    }
    Ok(Json(AuditResponse::from_report(report, now_millis())))
}
