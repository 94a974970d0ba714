// src/db/report_repo.rs
//
// Consultas agregadas dos relatórios. Todas recebem o período ($1 início, $2 fim,
// ambos opcionais e inclusivos) e trabalham sobre a data da venda.

use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Postgres};

use crate::{
    common::error::AppError,
    db::sales_repo::SALE_SUMMARY_SELECT,
    models::{
        finance::Transaction,
        reports::{
            BalanceSheetFigures, DateRange, GroupedTotalRow, InventoryReportRow, LowStockEntry,
            MonthlyProfitEntry, PaymentStatEntry, PeakHourEntry, PendingSaleReportRow, ProductProfitRow,
            SaleProfitRow, SaleReportRow, StockMetrics, TopProductEntry,
        },
        sales::SaleSummary,
    },
};

// Dias contados em UTC, independente do fuso da sessão
const IN_RANGE: &str = "($1::date IS NULL OR (s.created_at AT TIME ZONE 'UTC')::date >= $1) \
     AND ($2::date IS NULL OR (s.created_at AT TIME ZONE 'UTC')::date <= $2)";

// Custo (pelo custo atual do produto) de cada venda
const SALE_COST_LATERAL: &str = r#"
    LEFT JOIN LATERAL (
        SELECT SUM(p.cost_price * i.quantity) AS cost
        FROM sale_items i
        JOIN products p ON p.id = i.product_id
        WHERE i.sale_id = s.id
    ) sc ON TRUE
"#;

/// Limite de estoque usado pelo painel de relatórios (fixo, independe do mínimo do produto).
pub const DASHBOARD_LOW_STOCK_LIMIT: i32 = 5;

#[derive(Debug, Clone, Default, FromRow)]
pub struct SalesFigures {
    pub revenue: Decimal,
    pub count: i64,
    pub cost: Decimal,
}

#[derive(Clone, Default)]
pub struct ReportRepository;

impl ReportRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  PAINEL
    // =========================================================================

    pub async fn sales_figures<'e, E>(&self, executor: E, range: &DateRange) -> Result<SalesFigures, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(s.total), 0) AS revenue,
                   COUNT(*) AS count,
                   COALESCE(SUM(sc.cost), 0) AS cost
            FROM sales s
            {}
            WHERE s.status = 'COMPLETED' AND {}
            "#,
            SALE_COST_LATERAL, IN_RANGE
        );
        let figures = sqlx::query_as::<_, SalesFigures>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_one(executor)
            .await?;
        Ok(figures)
    }

    pub async fn monthly_profit<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<MonthlyProfitEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT TO_CHAR(DATE_TRUNC('month', s.created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
                   SUM(s.total) AS revenue,
                   COALESCE(SUM(sc.cost), 0) AS cost,
                   SUM(s.total) - COALESCE(SUM(sc.cost), 0) AS profit
            FROM sales s
            {}
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY 1
            ORDER BY 1
            "#,
            SALE_COST_LATERAL, IN_RANGE
        );
        let rows = sqlx::query_as::<_, MonthlyProfitEntry>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn payment_stats<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<PaymentStatEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT s.payment_method, SUM(s.total) AS total, COUNT(*) AS count
            FROM sales s
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY s.payment_method
            ORDER BY total DESC
            "#,
            IN_RANGE
        );
        let rows = sqlx::query_as::<_, PaymentStatEntry>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn peak_hours<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<PeakHourEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT EXTRACT(HOUR FROM s.created_at AT TIME ZONE 'UTC')::INTEGER AS hour, COUNT(*) AS count
            FROM sales s
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY 1
            ORDER BY 1
            "#,
            IN_RANGE
        );
        let rows = sqlx::query_as::<_, PeakHourEntry>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn top_products<'e, E>(
        &self,
        executor: E,
        range: &DateRange,
        limit: i64,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT p.name AS product_name, SUM(i.quantity)::BIGINT AS total_quantity
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY p.id, p.name
            ORDER BY total_quantity DESC
            LIMIT $3
            "#,
            IN_RANGE
        );
        let rows = sqlx::query_as::<_, TopProductEntry>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .bind(limit)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn stock_metrics<'e, E>(&self, executor: E) -> Result<StockMetrics, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let metrics = sqlx::query_as::<_, StockMetrics>(
            r#"
            SELECT COALESCE(SUM(stock_quantity * cost_price), 0) AS total_value,
                   COALESCE(SUM(stock_quantity), 0)::BIGINT AS total_items
            FROM products
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(metrics)
    }

    pub async fn low_stock_count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock_quantity <= $1")
            .bind(DASHBOARD_LOW_STOCK_LIMIT)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn low_stock_products<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<LowStockEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, LowStockEntry>(
            r#"
            SELECT name, stock_quantity, selling_price, image_url
            FROM products
            WHERE stock_quantity <= $1
            ORDER BY stock_quantity ASC, name ASC
            LIMIT $2
            "#,
        )
        .bind(DASHBOARD_LOW_STOCK_LIMIT)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn recent_sales<'e, E>(&self, executor: E, range: &DateRange, limit: i64) -> Result<Vec<SaleSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} WHERE s.status = 'COMPLETED' AND {} ORDER BY s.created_at DESC LIMIT $3",
            SALE_SUMMARY_SELECT, IN_RANGE
        );
        let rows = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .bind(limit)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // =========================================================================
    //  RELATÓRIOS TABULARES
    // =========================================================================

    // Todas as vendas do período, qualquer status
    pub async fn sales_rows<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<SaleReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT s.number, s.created_at, c.name AS customer_name, s.status, s.payment_method, s.total
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE {}
            ORDER BY s.created_at DESC
            "#,
            IN_RANGE
        );
        let rows = sqlx::query_as::<_, SaleReportRow>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn pending_rows<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<PendingSaleReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT s.number, s.created_at, c.name AS customer_name,
                   COALESCE(STRING_AGG(p.name || ' (' || i.quantity || ')', '; ' ORDER BY i.created_at), '') AS products,
                   COALESCE(SUM(i.quantity), 0)::BIGINT AS total_quantity,
                   s.total
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            LEFT JOIN sale_items i ON i.sale_id = s.id
            LEFT JOIN products p ON p.id = i.product_id
            WHERE s.status = 'PENDING' AND {}
            GROUP BY s.id, c.name
            ORDER BY s.created_at DESC
            "#,
            IN_RANGE
        );
        let rows = sqlx::query_as::<_, PendingSaleReportRow>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // Posição atual: o período não se aplica
    pub async fn inventory_rows<'e, E>(&self, executor: E) -> Result<Vec<InventoryReportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, InventoryReportRow>(
            r#"
            SELECT p.name, b.name AS brand_name, p.stock_quantity, p.cost_price, p.selling_price
            FROM products p
            LEFT JOIN brands b ON b.id = p.brand_id
            ORDER BY p.name ASC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn best_sellers<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<GroupedTotalRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT p.name AS label, SUM(i.quantity)::BIGINT AS quantity, SUM(i.price * i.quantity) AS total
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY p.id, p.name
            ORDER BY quantity DESC
            "#,
            IN_RANGE
        );
        self.grouped(executor, &sql, range).await
    }

    pub async fn sales_by_customer<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<GroupedTotalRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT c.name AS label, COUNT(*) AS quantity, SUM(s.total) AS total
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY c.id, c.name
            ORDER BY total DESC
            "#,
            IN_RANGE
        );
        self.grouped(executor, &sql, range).await
    }

    pub async fn sales_by_brand<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<GroupedTotalRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT b.name AS label, SUM(i.quantity)::BIGINT AS quantity, SUM(i.price * i.quantity) AS total
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            LEFT JOIN brands b ON b.id = p.brand_id
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY b.id, b.name
            ORDER BY total DESC
            "#,
            IN_RANGE
        );
        self.grouped(executor, &sql, range).await
    }

    pub async fn sales_by_user<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<GroupedTotalRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT u.username AS label, COUNT(*) AS quantity, SUM(s.total) AS total
            FROM sales s
            LEFT JOIN users u ON u.id = s.salesperson_id
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY u.id, u.username
            ORDER BY total DESC
            "#,
            IN_RANGE
        );
        self.grouped(executor, &sql, range).await
    }

    async fn grouped<'e, E>(&self, executor: E, sql: &str, range: &DateRange) -> Result<Vec<GroupedTotalRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, GroupedTotalRow>(sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn profit_by_product<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<ProductProfitRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT p.name, SUM(i.quantity)::BIGINT AS quantity,
                   SUM(i.price * i.quantity) AS revenue,
                   SUM(p.cost_price * i.quantity) AS cost
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            WHERE s.status = 'COMPLETED' AND {}
            GROUP BY p.id, p.name
            "#,
            IN_RANGE
        );
        let rows = sqlx::query_as::<_, ProductProfitRow>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn profit_by_sale<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<SaleProfitRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT s.number, s.created_at, c.name AS customer_name, s.total,
                   COALESCE(sc.cost, 0) AS cost
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            {}
            WHERE s.status = 'COMPLETED' AND {}
            ORDER BY s.created_at DESC
            "#,
            SALE_COST_LATERAL, IN_RANGE
        );
        let rows = sqlx::query_as::<_, SaleProfitRow>(&sql)
            .bind(range.start_date)
            .bind(range.end_date)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Movimento de caixa: lançamentos pelo dia do pagamento, mais recentes primeiro.
    pub async fn cash_flow<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE ($1::date IS NULL OR payment_date >= $1)
              AND ($2::date IS NULL OR payment_date <= $2)
            ORDER BY payment_date DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(range.start_date)
        .bind(range.end_date)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn balance_sheet<'e, E>(&self, executor: E) -> Result<BalanceSheetFigures, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let figures = sqlx::query_as::<_, BalanceSheetFigures>(
            r#"
            SELECT
                (SELECT COALESCE(SUM(stock_quantity * cost_price), 0) FROM products) AS stock_value,
                COALESCE(SUM(value) FILTER (WHERE kind = 'INCOME' AND status <> 'PAID'), 0) AS receivables,
                COALESCE(SUM(value) FILTER (WHERE kind = 'EXPENSE' AND status <> 'PAID'), 0) AS payables,
                COALESCE(SUM(value) FILTER (WHERE kind = 'INCOME' AND status = 'PAID'), 0)
                  - COALESCE(SUM(value) FILTER (WHERE kind = 'EXPENSE' AND status = 'PAID'), 0) AS cash_balance
            FROM transactions
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(figures)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn period_filter_counts_days_in_utc(pool: PgPool) {
        let repo = ReportRepository::new();
        let mut conn = pool.acquire().await.unwrap();

        // 01/02 01:30 UTC ainda é 31/01 em São Paulo
        sqlx::query("SET TIME ZONE 'America/Sao_Paulo'").execute(&mut *conn).await.unwrap();
        sqlx::query(
            "INSERT INTO sales (status, total, created_at) VALUES ('COMPLETED', 100, '2025-02-01 01:30:00+00')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        let february_first = NaiveDate::from_ymd_opt(2025, 2, 1);
        let range = DateRange { start_date: february_first, end_date: february_first };

        let figures = repo.sales_figures(&mut *conn, &range).await.unwrap();
        assert_eq!(figures.count, 1);
        assert_eq!(figures.revenue, Decimal::new(100, 0));

        let hours = repo.peak_hours(&mut *conn, &range).await.unwrap();
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].hour, 1);

        let january_last = NaiveDate::from_ymd_opt(2025, 1, 31);
        let previous_day = DateRange { start_date: january_last, end_date: january_last };
        assert_eq!(repo.sales_figures(&mut *conn, &previous_day).await.unwrap().count, 0);
    }
}
