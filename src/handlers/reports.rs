// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::reports::{DateRange, ReportQuery, ReportsDashboard, TabularReport},
};

// GET /api/reports/dashboard?startDate=&endDate=
#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    tag = "Reports",
    params(DateRange),
    responses((status = 200, description = "Indicadores das vendas finalizadas no período", body = ReportsDashboard)),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .report_service
        .dashboard(&app_state.db_pool, &range)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(dashboard)))
}

// GET /api/reports?kind=sales&startDate=&endDate=
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Relatório tabular {título, cabeçalhos, linhas, resumo}", body = TabularReport),
        (status = 400, description = "Tipo de relatório desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .tabular(&app_state.db_pool, query.kind, &query.range())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}
