// src/services/report_service.rs

use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::{FinanceRepository, ReportRepository},
    models::{
        finance::TransactionKind,
        reports::{DateRange, ReportData, ReportKind, ReportsDashboard, TabularReport},
    },
    services::report_builder::{build_report, sales_metrics},
};

const TOP_PRODUCTS_LIMIT: i64 = 5;
const LOW_STOCK_LIST_LIMIT: i64 = 10;
const RECENT_SALES_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    finance_repo: FinanceRepository,
}

impl ReportService {
    pub fn new(report_repo: ReportRepository, finance_repo: FinanceRepository) -> Self {
        Self { report_repo, finance_repo }
    }

    /// Painel gerencial sobre as vendas finalizadas do período.
    pub async fn dashboard<'a, A>(&self, conn: A, range: &DateRange) -> Result<ReportsDashboard, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let repo = &self.report_repo;

        let figures = repo.sales_figures(&mut *conn, range).await?;

        let dashboard = ReportsDashboard {
            sales_metrics: sales_metrics(figures.revenue, figures.count, figures.cost),
            monthly_profit: repo.monthly_profit(&mut *conn, range).await?,
            payment_stats: repo.payment_stats(&mut *conn, range).await?,
            peak_hours: repo.peak_hours(&mut *conn, range).await?,
            top_products: repo.top_products(&mut *conn, range, TOP_PRODUCTS_LIMIT).await?,
            stock_metrics: repo.stock_metrics(&mut *conn).await?,
            low_stock_count: repo.low_stock_count(&mut *conn).await?,
            low_stock_products: repo.low_stock_products(&mut *conn, LOW_STOCK_LIST_LIMIT).await?,
            recent_sales: repo.recent_sales(&mut *conn, range, RECENT_SALES_LIMIT).await?,
        };

        tracing::debug!(
            revenue = %dashboard.sales_metrics.total_revenue,
            count = dashboard.sales_metrics.total_count,
            "📊 Painel de relatórios montado"
        );
        Ok(dashboard)
    }

    /// Relatório tabular do tipo pedido, já formatado para exibição/exportação.
    pub async fn tabular<'a, A>(&self, conn: A, kind: ReportKind, range: &DateRange) -> Result<TabularReport, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let repo = &self.report_repo;

        let data = match kind {
            ReportKind::Sales => ReportData::Sales(repo.sales_rows(&mut *conn, range).await?),
            ReportKind::Pending => ReportData::Pending(repo.pending_rows(&mut *conn, range).await?),
            ReportKind::Inventory => ReportData::Inventory(repo.inventory_rows(&mut *conn).await?),
            ReportKind::BestSellers => ReportData::BestSellers(repo.best_sellers(&mut *conn, range).await?),
            ReportKind::SalesByCustomer => {
                ReportData::SalesByCustomer(repo.sales_by_customer(&mut *conn, range).await?)
            }
            ReportKind::SalesByBrand => ReportData::SalesByBrand(repo.sales_by_brand(&mut *conn, range).await?),
            ReportKind::SalesByUser => ReportData::SalesByUser(repo.sales_by_user(&mut *conn, range).await?),
            ReportKind::SalesByPayment => ReportData::SalesByPayment(repo.payment_stats(&mut *conn, range).await?),
            ReportKind::ProfitByProduct => {
                ReportData::ProfitByProduct(repo.profit_by_product(&mut *conn, range).await?)
            }
            ReportKind::ProfitBySale => ReportData::ProfitBySale(repo.profit_by_sale(&mut *conn, range).await?),
            ReportKind::CashFlow => ReportData::CashFlow(repo.cash_flow(&mut *conn, range).await?),
            ReportKind::FinancialExpenses => ReportData::FinancialExpenses(
                self.finance_repo
                    .list_in_period(&mut *conn, Some(TransactionKind::Expense), range.start_date, range.end_date)
                    .await?,
            ),
            ReportKind::BalanceSheet => ReportData::BalanceSheet(repo.balance_sheet(&mut *conn).await?),
        };

        let report = build_report(data);
        tracing::info!(kind = ?kind, rows = report.rows.len(), "📄 Relatório gerado: {}", report.title);
        Ok(report)
    }
}
