//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o filtro; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📚 Documentação em http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let inventory_routes = Router::new()
        .route(
            "/categories",
            post(handlers::inventory::create_category).get(handlers::inventory::get_all_categories),
        )
        .route(
            "/brands",
            post(handlers::inventory::create_brand).get(handlers::inventory::get_all_brands),
        )
        .route(
            "/olfactory-families",
            post(handlers::inventory::create_olfactory_family).get(handlers::inventory::get_all_olfactory_families),
        )
        .route(
            "/suppliers",
            post(handlers::inventory::create_supplier).get(handlers::inventory::get_all_suppliers),
        )
        .route(
            "/products",
            post(handlers::inventory::create_product).get(handlers::inventory::get_all_products),
        )
        .route(
            "/products/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/pos/products", get(handlers::inventory::pos_search_products))
        .route("/movements", post(handlers::inventory::create_stock_movement))
        .route("/stock", get(handlers::inventory::get_stock_overview))
        .route(
            "/kits",
            post(handlers::inventory::create_kit).get(handlers::inventory::get_all_kits),
        )
        .route(
            "/kits/{id}",
            put(handlers::inventory::update_kit).delete(handlers::inventory::delete_kit),
        )
        .route("/kits/{id}/components", post(handlers::inventory::add_kit_component))
        .route(
            "/kits/{id}/components/{component_id}",
            delete(handlers::inventory::remove_kit_component),
        );

    let crm_routes = Router::new()
        .route(
            "/customers",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route(
            "/customers/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        .route("/pos/customers", get(handlers::crm::pos_search_customers));

    let sales_routes = Router::new()
        .route("/", post(handlers::sales::create_sale).get(handlers::sales::list_sales))
        .route("/pending", get(handlers::sales::list_pending_sales))
        .route(
            "/{id}",
            get(handlers::sales::get_sale).delete(handlers::sales::delete_pending_sale),
        )
        .route("/{id}/finalize", post(handlers::sales::finalize_sale))
        .route("/{id}/cancel", post(handlers::sales::cancel_sale))
        .route("/{id}/items", post(handlers::sales::add_sale_item))
        .route("/{id}/adjustments", put(handlers::sales::update_sale_adjustments))
        .route("/{id}/payments", post(handlers::sales::register_payment));

    let finance_routes = Router::new()
        .route(
            "/transactions",
            post(handlers::finance::create_transaction).get(handlers::finance::list_transactions),
        )
        .route(
            "/transactions/{id}",
            get(handlers::finance::get_transaction)
                .put(handlers::finance::update_transaction)
                .delete(handlers::finance::delete_transaction),
        )
        .route("/dashboard", get(handlers::finance::get_dashboard))
        .route("/reports", get(handlers::finance::get_financial_reports));

    let report_routes = Router::new()
        .route("/", get(handlers::reports::get_report))
        .route("/dashboard", get(handlers::reports::get_dashboard));

    let settings_routes = Router::new()
        .route(
            "/",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/payment-methods",
            post(handlers::settings::create_payment_method).get(handlers::settings::list_payment_methods),
        )
        .route("/payment-methods/{id}/toggle", patch(handlers::settings::toggle_payment_method));

    // Tudo que é negócio passa pelo guarda de autenticação
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/inventory", inventory_routes)
        .nest("/crm", crm_routes)
        .nest("/sales", sales_routes)
        .nest("/finance", finance_routes)
        .nest("/reports", report_routes)
        .nest("/settings", settings_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
