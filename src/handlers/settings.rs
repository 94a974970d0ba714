// src/handlers/settings.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::settings::{CompanySettings, CreatePaymentMethodPayload, PaymentMethodConfig, UpdateSettingsRequest},
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses((status = 200, description = "Dados da empresa (padrões se ainda não configurados)", body = CompanySettings)),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state
        .settings_repo
        .get_settings(&app_state.db_pool)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/settings
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Dados da empresa atualizados", body = CompanySettings),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let updated = app_state
        .settings_repo
        .update_settings(&app_state.db_pool, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    tracing::info!("⚙️ Configurações da empresa atualizadas");
    Ok((StatusCode::OK, Json(updated)))
}

// GET /api/settings/payment-methods
#[utoipa::path(
    get,
    path = "/api/settings/payment-methods",
    tag = "Settings",
    responses((status = 200, description = "Formas de pagamento configuradas", body = Vec<PaymentMethodConfig>)),
    security(("api_jwt" = []))
)]
pub async fn list_payment_methods(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let methods = app_state
        .settings_repo
        .list_payment_methods(&app_state.db_pool)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(methods)))
}

// POST /api/settings/payment-methods
#[utoipa::path(
    post,
    path = "/api/settings/payment-methods",
    tag = "Settings",
    request_body = CreatePaymentMethodPayload,
    responses(
        (status = 201, description = "Forma de pagamento criada", body = PaymentMethodConfig),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreatePaymentMethodPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let method = app_state
        .settings_repo
        .create_payment_method(&app_state.db_pool, payload.name.trim(), payload.active)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(method)))
}

// PATCH /api/settings/payment-methods/{id}/toggle
#[utoipa::path(
    patch,
    path = "/api/settings/payment-methods/{id}/toggle",
    tag = "Settings",
    params(("id" = Uuid, Path, description = "ID da forma de pagamento")),
    responses(
        (status = 200, description = "Forma de pagamento ativada/desativada", body = PaymentMethodConfig),
        (status = 404, description = "Forma de pagamento não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let method = app_state
        .settings_repo
        .toggle_payment_method(&app_state.db_pool, id)
        .await
        .and_then(|found| found.ok_or_else(|| AppError::ResourceNotFound("Forma de pagamento".into())))
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(method)))
}
