// src/handlers/inventory.rs

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
    db::inventory_repo::AppliedMovement,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::inventory::{
        AddKitComponentPayload, Brand, Category, CreateNamedPayload, CreateProductPayload, CreateSupplierPayload,
        KitPayload, KitWithComponents, OlfactoryFamily, PosProduct, Product, ProductComponent, ProductListRow,
        ProductPayload, SearchQuery, StockMovementPayload, StockOverview, Supplier,
    },
};

// =============================================================================
//  CADASTROS AUXILIARES
// =============================================================================

// GET /api/inventory/categories
#[utoipa::path(
    get,
    path = "/api/inventory/categories",
    tag = "Inventory",
    responses((status = 200, description = "Categorias", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .inventory_service
        .list_categories(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(categories)))
}

// POST /api/inventory/categories
#[utoipa::path(
    post,
    path = "/api/inventory/categories",
    tag = "Inventory",
    request_body = CreateNamedPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let category = app_state
        .inventory_service
        .create_category(&app_state.db_pool, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/inventory/brands
#[utoipa::path(
    get,
    path = "/api/inventory/brands",
    tag = "Inventory",
    responses((status = 200, description = "Marcas", body = Vec<Brand>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_brands(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let brands = app_state
        .inventory_service
        .list_brands(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(brands)))
}

// POST /api/inventory/brands
#[utoipa::path(
    post,
    path = "/api/inventory/brands",
    tag = "Inventory",
    request_body = CreateNamedPayload,
    responses(
        (status = 201, description = "Marca criada", body = Brand),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_brand(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let brand = app_state
        .inventory_service
        .create_brand(&app_state.db_pool, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(brand)))
}

// GET /api/inventory/olfactory-families
#[utoipa::path(
    get,
    path = "/api/inventory/olfactory-families",
    tag = "Inventory",
    responses((status = 200, description = "Famílias olfativas", body = Vec<OlfactoryFamily>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_olfactory_families(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let families = app_state
        .inventory_service
        .list_olfactory_families(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(families)))
}

// POST /api/inventory/olfactory-families
#[utoipa::path(
    post,
    path = "/api/inventory/olfactory-families",
    tag = "Inventory",
    request_body = CreateNamedPayload,
    responses(
        (status = 201, description = "Família olfativa criada", body = OlfactoryFamily),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_olfactory_family(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let family = app_state
        .inventory_service
        .create_olfactory_family(&app_state.db_pool, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(family)))
}

// GET /api/inventory/suppliers
#[utoipa::path(
    get,
    path = "/api/inventory/suppliers",
    tag = "Inventory",
    responses((status = 200, description = "Fornecedores", body = Vec<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .inventory_service
        .list_suppliers(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(suppliers)))
}

// POST /api/inventory/suppliers
#[utoipa::path(
    post,
    path = "/api/inventory/suppliers",
    tag = "Inventory",
    request_body = CreateSupplierPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Supplier),
        (status = 400, description = "CPF/CNPJ inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let supplier = app_state
        .inventory_service
        .create_supplier(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

// =============================================================================
//  PRODUTOS
// =============================================================================

// GET /api/inventory/products?q=
#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Inventory",
    params(SearchQuery),
    responses((status = 200, description = "Produtos em ordem alfabética", body = Vec<ProductListRow>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products(&app_state.db_pool, query.q.as_deref(), Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(products)))
}

// POST /api/inventory/products
#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos (kits são criados em /kits)"),
        (status = 409, description = "Código de barras já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let product = app_state
        .inventory_service
        .create_product(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/inventory/products/{id}
#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = ProductListRow),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .get_product(&app_state.db_pool, id, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(product)))
}

// PUT /api/inventory/products/{id}
#[utoipa::path(
    put,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado (o estoque não é alterado)", body = Product),
        (status = 400, description = "Dados inválidos ou troca de/para o tipo kit"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let product = app_state
        .inventory_service
        .update_product(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/inventory/products/{id}
#[utoipa::path(
    delete,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto excluído"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Produto já usado em vendas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .inventory_service
        .delete_product(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/inventory/pos/products?q=
#[utoipa::path(
    get,
    path = "/api/inventory/pos/products",
    tag = "POS",
    params(SearchQuery),
    responses((status = 200, description = "Até 20 produtos para o PDV, com componentes dos kits", body = Vec<PosProduct>)),
    security(("api_jwt" = []))
)]
pub async fn pos_search_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .pos_search(&app_state.db_pool, query.q.as_deref().unwrap_or_default())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(products)))
}

// =============================================================================
//  ESTOQUE
// =============================================================================

// POST /api/inventory/movements
#[utoipa::path(
    post,
    path = "/api/inventory/movements",
    tag = "Inventory",
    request_body = StockMovementPayload,
    responses(
        (status = 201, description = "Movimentação registrada e saldo atualizado", body = AppliedMovement),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_stock_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<StockMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let applied = app_state
        .inventory_service
        .record_manual_movement(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(applied)))
}

// GET /api/inventory/stock
#[utoipa::path(
    get,
    path = "/api/inventory/stock",
    tag = "Inventory",
    responses((status = 200, description = "Últimas movimentações, estoque baixo e validades próximas", body = StockOverview)),
    security(("api_jwt" = []))
)]
pub async fn get_stock_overview(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .inventory_service
        .stock_overview(&app_state.db_pool, Utc::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(overview)))
}

// =============================================================================
//  KITS
// =============================================================================

// GET /api/inventory/kits
#[utoipa::path(
    get,
    path = "/api/inventory/kits",
    tag = "Kits",
    responses((status = 200, description = "Kits com seus componentes", body = Vec<KitWithComponents>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_kits(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let kits = app_state
        .inventory_service
        .list_kits(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(kits)))
}

// POST /api/inventory/kits
#[utoipa::path(
    post,
    path = "/api/inventory/kits",
    tag = "Kits",
    request_body = KitPayload,
    responses((status = 201, description = "Kit criado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn create_kit(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Json(payload): Json<KitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let kit = app_state
        .inventory_service
        .create_kit(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(kit)))
}

// PUT /api/inventory/kits/{id}
#[utoipa::path(
    put,
    path = "/api/inventory/kits/{id}",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID do kit")),
    request_body = KitPayload,
    responses(
        (status = 200, description = "Kit atualizado", body = Product),
        (status = 404, description = "Kit não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_kit(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<KitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let kit = app_state
        .inventory_service
        .update_kit(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(kit)))
}

// DELETE /api/inventory/kits/{id}
#[utoipa::path(
    delete,
    path = "/api/inventory/kits/{id}",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID do kit")),
    responses(
        (status = 204, description = "Kit excluído"),
        (status = 404, description = "Kit não encontrado"),
        (status = 409, description = "Kit já usado em vendas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_kit(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .inventory_service
        .delete_kit(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/inventory/kits/{id}/components
#[utoipa::path(
    post,
    path = "/api/inventory/kits/{id}/components",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID do kit")),
    request_body = AddKitComponentPayload,
    responses(
        (status = 201, description = "Componente no kit (o existente, se já estava)", body = ProductComponent),
        (status = 400, description = "Componente inválido"),
        (status = 404, description = "Kit ou componente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_kit_component(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(kit_id): Path<Uuid>,
    Json(payload): Json<AddKitComponentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let component = app_state
        .inventory_service
        .add_kit_component(&app_state.db_pool, kit_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(component)))
}

// DELETE /api/inventory/kits/{id}/components/{component_id}
#[utoipa::path(
    delete,
    path = "/api/inventory/kits/{id}/components/{component_id}",
    tag = "Kits",
    params(
        ("id" = Uuid, Path, description = "ID do kit"),
        ("component_id" = Uuid, Path, description = "ID da linha de composição")
    ),
    responses(
        (status = 204, description = "Componente removido"),
        (status = 404, description = "Componente não encontrado no kit")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_kit_component(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path((kit_id, component_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .inventory_service
        .remove_kit_component(&app_state.db_pool, kit_id, component_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
