// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::db;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Inventory ---
        handlers::inventory::get_all_categories,
        handlers::inventory::create_category,
        handlers::inventory::get_all_brands,
        handlers::inventory::create_brand,
        handlers::inventory::get_all_olfactory_families,
        handlers::inventory::create_olfactory_family,
        handlers::inventory::get_all_suppliers,
        handlers::inventory::create_supplier,
        handlers::inventory::get_all_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::create_stock_movement,
        handlers::inventory::get_stock_overview,

        // --- Kits ---
        handlers::inventory::get_all_kits,
        handlers::inventory::create_kit,
        handlers::inventory::update_kit,
        handlers::inventory::delete_kit,
        handlers::inventory::add_kit_component,
        handlers::inventory::remove_kit_component,

        // --- POS ---
        handlers::inventory::pos_search_products,
        handlers::crm::pos_search_customers,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,

        // --- Sales ---
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::list_pending_sales,
        handlers::sales::get_sale,
        handlers::sales::delete_pending_sale,
        handlers::sales::finalize_sale,
        handlers::sales::cancel_sale,
        handlers::sales::add_sale_item,
        handlers::sales::update_sale_adjustments,
        handlers::sales::register_payment,

        // --- Finance ---
        handlers::finance::list_transactions,
        handlers::finance::create_transaction,
        handlers::finance::get_transaction,
        handlers::finance::update_transaction,
        handlers::finance::delete_transaction,
        handlers::finance::get_dashboard,
        handlers::finance::get_financial_reports,

        // --- Reports ---
        handlers::reports::get_dashboard,
        handlers::reports::get_report,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::settings::list_payment_methods,
        handlers::settings::create_payment_method,
        handlers::settings::toggle_payment_method,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Inventory ---
            models::inventory::Category,
            models::inventory::Brand,
            models::inventory::OlfactoryFamily,
            models::inventory::Supplier,
            models::inventory::ProductKind,
            models::inventory::ProductGender,
            models::inventory::ValidityStatus,
            models::inventory::Product,
            models::inventory::ProductListRow,
            models::inventory::ProductComponent,
            models::inventory::KitComponentDetail,
            models::inventory::KitWithComponents,
            models::inventory::PosProduct,
            models::inventory::StockMovementReason,
            models::inventory::StockMovement,
            models::inventory::StockMovementRow,
            models::inventory::StockOverview,
            models::inventory::MovementDirection,
            db::inventory_repo::AppliedMovement,

            // --- Inventory Payloads ---
            models::inventory::CreateNamedPayload,
            models::inventory::CreateSupplierPayload,
            models::inventory::ProductPayload,
            models::inventory::CreateProductPayload,
            models::inventory::StockMovementPayload,
            models::inventory::KitPayload,
            models::inventory::AddKitComponentPayload,

            // --- CRM ---
            models::crm::CustomerClassification,
            models::crm::Customer,
            models::crm::CustomerLookup,
            models::crm::CustomerPayload,

            // --- Sales ---
            models::sales::SaleStatus,
            models::sales::PaymentMethod,
            models::sales::AdjustmentType,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleItemDetail,
            models::sales::SaleDetail,
            models::sales::SaleSummary,
            models::sales::SaleItemPayload,
            models::sales::CreateSalePayload,
            models::sales::UpdateSaleAdjustmentsPayload,
            models::sales::RegisterPaymentPayload,

            // --- Finance ---
            models::finance::TransactionKind,
            models::finance::TransactionStatus,
            models::finance::Transaction,
            models::finance::TransactionPayload,
            models::finance::FinanceDashboard,
            models::finance::ProfitEntry,
            models::finance::FinancialReports,

            // --- Reports ---
            models::reports::SalesMetrics,
            models::reports::MonthlyProfitEntry,
            models::reports::PaymentStatEntry,
            models::reports::PeakHourEntry,
            models::reports::TopProductEntry,
            models::reports::StockMetrics,
            models::reports::LowStockEntry,
            models::reports::ReportsDashboard,
            models::reports::ReportKind,
            models::reports::TabularReport,

            // --- Settings ---
            models::settings::CompanySettings,
            models::settings::UpdateSettingsRequest,
            models::settings::PaymentMethodConfig,
            models::settings::CreatePaymentMethodPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Inventory", description = "Catálogo de Produtos e Estoque"),
        (name = "Kits", description = "Kits/Combos e seus componentes"),
        (name = "POS", description = "Buscas rápidas do Ponto de Venda"),
        (name = "CRM", description = "Clientes"),
        (name = "Sales", description = "Vendas, Orçamentos e Pagamentos"),
        (name = "Finance", description = "Contas a Pagar e Receber"),
        (name = "Reports", description = "Indicadores e Relatórios Gerenciais"),
        (name = "Settings", description = "Configurações da Loja")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_business_routes_with_jwt_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/sales/{id}/finalize"));
        assert!(doc.paths.paths.contains_key("/api/reports"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(components.schemas.contains_key("CreateSalePayload"));
    }
}
