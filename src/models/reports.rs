// src/models/reports.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::{
    finance::Transaction,
    sales::{PaymentMethod, SaleStatus, SaleSummary},
};

// Filtro de período (datas inclusivas, pela data da venda)
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[param(value_type = Option<String>, format = Date, example = "2025-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date, example = "2025-01-31")]
    pub end_date: Option<NaiveDate>,
}

// =============================================================================
//  DASHBOARD GERENCIAL
// =============================================================================

#[derive(Debug, Serialize, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetrics {
    pub total_revenue: Decimal,
    pub total_count: i64,
    pub avg_ticket: Decimal,
    // Custo atual do produto x quantidade vendida
    pub total_cost: Decimal,
    pub gross_profit: Decimal,
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProfitEntry {
    #[schema(example = "2025-01")]
    pub month: String,
    pub revenue: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatEntry {
    pub payment_method: PaymentMethod,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeakHourEntry {
    pub hour: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_name: String,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct StockMetrics {
    // Σ estoque x custo
    pub total_value: Decimal,
    pub total_items: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEntry {
    pub name: String,
    pub stock_quantity: i32,
    pub selling_price: Decimal,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportsDashboard {
    pub sales_metrics: SalesMetrics,
    pub monthly_profit: Vec<MonthlyProfitEntry>,
    pub payment_stats: Vec<PaymentStatEntry>,
    pub peak_hours: Vec<PeakHourEntry>,
    pub top_products: Vec<TopProductEntry>,
    pub stock_metrics: StockMetrics,
    pub low_stock_count: i64,
    pub low_stock_products: Vec<LowStockEntry>,
    pub recent_sales: Vec<SaleSummary>,
}

// =============================================================================
//  RELATÓRIOS TABULARES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Pending,
    Inventory,
    BestSellers,
    SalesByCustomer,
    SalesByBrand,
    SalesByUser,
    SalesByPayment,
    ProfitByProduct,
    ProfitBySale,
    CashFlow,
    FinancialExpenses,
    BalanceSheet,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[param(inline)]
    pub kind: ReportKind,
    #[param(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
}

impl ReportQuery {
    pub fn range(&self) -> DateRange {
        DateRange { start_date: self.start_date, end_date: self.end_date }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabularReport {
    pub kind: ReportKind,
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub summary: BTreeMap<String, String>,
}

// --- Linhas vindas do banco, já agregadas, que viram relatório ---

#[derive(Debug, Clone, FromRow)]
pub struct SaleReportRow {
    pub number: i64,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct PendingSaleReportRow {
    pub number: i64,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    // "Malbec (2); Kit Natal (1)"
    pub products: String,
    pub total_quantity: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryReportRow {
    pub name: String,
    pub brand_name: Option<String>,
    pub stock_quantity: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
}

// Agrupamento genérico: rótulo (pode faltar), quantidade e valor
#[derive(Debug, Clone, FromRow)]
pub struct GroupedTotalRow {
    pub label: Option<String>,
    pub quantity: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProductProfitRow {
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct SaleProfitRow {
    pub number: i64,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub total: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct BalanceSheetFigures {
    pub stock_value: Decimal,
    pub receivables: Decimal,
    pub payables: Decimal,
    pub cash_balance: Decimal,
}

// Dados brutos de cada tipo de relatório
#[derive(Debug, Clone)]
pub enum ReportData {
    Sales(Vec<SaleReportRow>),
    Pending(Vec<PendingSaleReportRow>),
    Inventory(Vec<InventoryReportRow>),
    BestSellers(Vec<GroupedTotalRow>),
    SalesByCustomer(Vec<GroupedTotalRow>),
    SalesByBrand(Vec<GroupedTotalRow>),
    SalesByUser(Vec<GroupedTotalRow>),
    SalesByPayment(Vec<PaymentStatEntry>),
    ProfitByProduct(Vec<ProductProfitRow>),
    ProfitBySale(Vec<SaleProfitRow>),
    CashFlow(Vec<Transaction>),
    FinancialExpenses(Vec<Transaction>),
    BalanceSheet(BalanceSheetFigures),
}
