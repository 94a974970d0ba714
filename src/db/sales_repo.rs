// src/db/sales_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{
        AdjustmentType, PaymentMethod, Sale, SaleItem, SaleItemDetail, SaleStatus, SaleSummary,
        UpdateSaleAdjustmentsPayload,
    },
};

// Cabeçalho + cliente + total pago (receitas vinculadas) + saldo restante.
// Reaproveitado pelos relatórios.
pub(crate) const SALE_SUMMARY_SELECT: &str = r#"
    SELECT s.*, c.name AS customer_name,
           COALESCE(paid.amount, 0) AS amount_paid,
           GREATEST(s.total - COALESCE(paid.amount, 0), 0) AS remaining
    FROM sales s
    LEFT JOIN customers c ON c.id = s.customer_id
    LEFT JOIN LATERAL (
        SELECT SUM(t.value) AS amount
        FROM transactions t
        WHERE t.sale_id = s.id AND t.kind = 'INCOME'
    ) paid ON TRUE
"#;

// Dados de cabeçalho de uma venda nova
#[derive(Debug, Clone)]
pub struct NewSale {
    pub salesperson_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub installments: i32,
    pub discount_value: Decimal,
    pub discount_type: AdjustmentType,
    pub tax_value: Decimal,
    pub tax_type: AdjustmentType,
    pub status: SaleStatus,
}

// Nomes e valores agregados que completam o detalhe da venda
#[derive(Debug, Clone, FromRow)]
pub struct SaleDetailExtras {
    pub customer_name: Option<String>,
    pub salesperson_name: Option<String>,
    pub amount_paid: Decimal,
}

#[derive(Clone, Default)]
pub struct SalesRepository;

impl SalesRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Cabeçalho
    // ---

    pub async fn insert_sale<'e, E>(&self, executor: E, sale: &NewSale) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                salesperson_id, customer_id, payment_method, installments,
                discount_value, discount_type, tax_value, tax_type, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(sale.salesperson_id)
        .bind(sale.customer_id)
        .bind(sale.payment_method)
        .bind(sale.installments)
        .bind(sale.discount_value)
        .bind(sale.discount_type)
        .bind(sale.tax_value)
        .bind(sale.tax_type)
        .bind(sale.status)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn find_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    /// Trava a linha da venda até o fim da transação.
    /// Duas finalizações simultâneas da mesma venda ficam serializadas aqui.
    pub async fn lock_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn update_totals<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        total: Decimal,
        commission: Decimal,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET total = $2, commission = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(total)
        .bind(commission)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn update_status<'e, E>(&self, executor: E, id: Uuid, status: SaleStatus) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            "UPDATE sales SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn update_adjustments<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateSaleAdjustmentsPayload,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET
                payment_method = $2, installments = $3,
                discount_value = $4, discount_type = $5,
                tax_value = $6, tax_type = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.payment_method)
        .bind(payload.installments)
        .bind(payload.discount_value)
        .bind(payload.discount_type)
        .bind(payload.tax_value)
        .bind(payload.tax_type)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn delete_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Itens
    // ---

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
        subtotal: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .bind(subtotal)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn list_items<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_item_details<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<SaleItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT i.*, p.name AS product_name
            FROM sale_items i
            JOIN products p ON p.id = i.product_id
            WHERE i.sale_id = $1
            ORDER BY i.created_at ASC, i.id ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // ---
    // Consultas
    // ---

    pub async fn find_detail_extras<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<SaleDetailExtras, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let extras = sqlx::query_as::<_, SaleDetailExtras>(
            r#"
            SELECT c.name AS customer_name,
                   u.username AS salesperson_name,
                   COALESCE((
                       SELECT SUM(t.value) FROM transactions t
                       WHERE t.sale_id = s.id AND t.kind = 'INCOME'
                   ), 0) AS amount_paid
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            LEFT JOIN users u ON u.id = s.salesperson_id
            WHERE s.id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_one(executor)
        .await?;
        Ok(extras)
    }

    /// Lista as vendas (mais recentes primeiro), opcionalmente filtrando pelo status.
    pub async fn list_sales<'e, E>(&self, executor: E, status: Option<SaleStatus>) -> Result<Vec<SaleSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} WHERE ($1::sale_status IS NULL OR s.status = $1) ORDER BY s.created_at DESC",
            SALE_SUMMARY_SELECT
        );
        let sales = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(status)
            .fetch_all(executor)
            .await?;
        Ok(sales)
    }
}
