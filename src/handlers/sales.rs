// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        finance::Transaction,
        sales::{
            CreateSalePayload, RegisterPaymentPayload, Sale, SaleDetail, SaleItemPayload, SaleListQuery,
            SaleSummary, UpdateSaleAdjustmentsPayload,
        },
    },
};

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda criada (pendente reserva, finalizada baixa o estoque)", body = Sale),
        (status = 400, description = "Venda sem itens, quantidade inválida ou status inicial inválido"),
        (status = 404, description = "Cliente ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let sale = app_state
        .sales_service
        .create_sale(&app_state.db_pool, Some(user.id), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

// GET /api/sales?status=
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleListQuery),
    responses((status = 200, description = "Vendas (mais recentes primeiro)", body = Vec<SaleSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .sales_service
        .list_sales(&app_state.db_pool, query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(sales)))
}

// GET /api/sales/pending
#[utoipa::path(
    get,
    path = "/api/sales/pending",
    tag = "Sales",
    responses((status = 200, description = "Vendas pendentes com valor pago e saldo", body = Vec<SaleSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .sales_service
        .list_pending_sales(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(sales)))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda com itens e pagamentos", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sales_service
        .get_sale(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(sale)))
}

// DELETE /api/sales/{id}
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda pendente")),
    responses(
        (status = 204, description = "Orçamento excluído e reservas devolvidas ao estoque"),
        (status = 404, description = "Venda não encontrada"),
        (status = 409, description = "Somente vendas pendentes podem ser excluídas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_pending_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .sales_service
        .delete_pending_sale(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/sales/{id}/finalize
#[utoipa::path(
    post,
    path = "/api/sales/{id}/finalize",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda finalizada (repetir não altera nada)", body = Sale),
        (status = 404, description = "Venda não encontrada"),
        (status = 409, description = "Venda cancelada não pode ser finalizada")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sales_service
        .finalize_sale(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(sale)))
}

// POST /api/sales/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/sales/{id}/cancel",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda cancelada e estoque devolvido", body = Sale),
        (status = 404, description = "Venda não encontrada"),
        (status = 409, description = "Venda já cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sales_service
        .cancel_sale(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(sale)))
}

// POST /api/sales/{id}/items
#[utoipa::path(
    post,
    path = "/api/sales/{id}/items",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda pendente")),
    request_body = SaleItemPayload,
    responses(
        (status = 201, description = "Item adicionado; totais recalculados", body = Sale),
        (status = 404, description = "Venda ou produto não encontrado"),
        (status = 409, description = "Venda não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_sale_item(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaleItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let sale = app_state
        .sales_service
        .add_item(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

// PUT /api/sales/{id}/adjustments
#[utoipa::path(
    put,
    path = "/api/sales/{id}/adjustments",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda pendente")),
    request_body = UpdateSaleAdjustmentsPayload,
    responses(
        (status = 200, description = "Desconto/acréscimo/pagamento atualizados; totais recalculados", body = Sale),
        (status = 404, description = "Venda não encontrada"),
        (status = 409, description = "Venda não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sale_adjustments(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaleAdjustmentsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let sale = app_state
        .sales_service
        .update_adjustments(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(sale)))
}

// POST /api/sales/{id}/payments
#[utoipa::path(
    post,
    path = "/api/sales/{id}/payments",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    request_body = RegisterPaymentPayload,
    responses(
        (status = 201, description = "Pagamento lançado como receita paga", body = Transaction),
        (status = 400, description = "Valor inválido"),
        (status = 404, description = "Venda não encontrada"),
        (status = 409, description = "Venda cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegisterPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let transaction = app_state
        .sales_service
        .register_payment(&app_state.db_pool, id, &payload, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
