// src/db/finance_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::finance::{ProfitEntry, Transaction, TransactionKind, TransactionPayload, TransactionStatus},
};

#[derive(Debug, Clone, Default, FromRow)]
pub struct PaidTotals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
}

#[derive(Clone, Default)]
pub struct FinanceRepository;

impl FinanceRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LANÇAMENTOS
    // =========================================================================

    pub async fn create_transaction<'e, E>(
        &self,
        executor: E,
        payload: &TransactionPayload,
    ) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (description, kind, value, due_date, payment_date, status, sale_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&payload.description)
        .bind(payload.kind)
        .bind(payload.value)
        .bind(payload.due_date)
        .bind(payload.payment_date)
        .bind(payload.status)
        .bind(payload.sale_id)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::on_foreign_key_violation(e, "Venda"))?;
        Ok(transaction)
    }

    pub async fn update_transaction<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &TransactionPayload,
    ) -> Result<Option<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions SET
                description = $2, kind = $3, value = $4, due_date = $5,
                payment_date = $6, status = $7, sale_id = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.description)
        .bind(payload.kind)
        .bind(payload.value)
        .bind(payload.due_date)
        .bind(payload.payment_date)
        .bind(payload.status)
        .bind(payload.sale_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::on_foreign_key_violation(e, "Venda"))?;
        Ok(transaction)
    }

    pub async fn find_transaction<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(transaction)
    }

    pub async fn delete_transaction<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_transactions<'e, E>(&self, executor: E) -> Result<Vec<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions ORDER BY due_date ASC, created_at ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(transactions)
    }

    /// Lançamentos com vencimento no período (limites opcionais e inclusivos).
    pub async fn list_in_period<'e, E>(
        &self,
        executor: E,
        kind: Option<TransactionKind>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE ($1::transaction_kind IS NULL OR kind = $1)
              AND ($2::date IS NULL OR due_date >= $2)
              AND ($3::date IS NULL OR due_date <= $3)
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
        .bind(kind)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;
        Ok(transactions)
    }

    // =========================================================================
    //  PAINEL
    // =========================================================================

    pub async fn paid_totals<'e, E>(&self, executor: E) -> Result<PaidTotals, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let totals = sqlx::query_as::<_, PaidTotals>(
            r#"
            SELECT
                COALESCE(SUM(value) FILTER (WHERE kind = 'INCOME'), 0) AS total_income,
                COALESCE(SUM(value) FILTER (WHERE kind = 'EXPENSE'), 0) AS total_expense
            FROM transactions
            WHERE status = 'PAID'
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(totals)
    }

    /// Em aberto (não pagos) de um tipo, por vencimento.
    pub async fn list_open<'e, E>(&self, executor: E, kind: TransactionKind) -> Result<Vec<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE kind = $1 AND status <> $2 ORDER BY due_date ASC",
        )
        .bind(kind)
        .bind(TransactionStatus::Paid)
        .fetch_all(executor)
        .await?;
        Ok(transactions)
    }

    /// Recebíveis em aberto vencidos antes de `today`.
    pub async fn list_overdue_receivables<'e, E>(&self, executor: E, today: NaiveDate) -> Result<Vec<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE kind = 'INCOME' AND status <> 'PAID' AND due_date < $1
            ORDER BY due_date ASC
            "#,
        )
        .bind(today)
        .fetch_all(executor)
        .await?;
        Ok(transactions)
    }

    // =========================================================================
    //  INDICADORES
    // =========================================================================

    pub async fn average_ticket<'e, E>(&self, executor: E) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let avg: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(ROUND(AVG(total), 2), 0) FROM sales WHERE status = 'COMPLETED'",
        )
        .fetch_one(executor)
        .await?;
        Ok(avg)
    }

    // Lucro bruto = (preço vendido - custo atual) x quantidade, somado por nome do produto
    pub async fn top_products_by_profit<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<ProfitEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, ProfitEntry>(
            r#"
            SELECT p.name AS name, SUM((i.price - p.cost_price) * i.quantity) AS profit
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            WHERE s.status = 'COMPLETED'
            GROUP BY p.name
            ORDER BY profit DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }

    pub async fn top_brands_by_profit<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<ProfitEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, ProfitEntry>(
            r#"
            SELECT COALESCE(b.name, 'Sem Marca') AS name,
                   SUM((i.price - p.cost_price) * i.quantity) AS profit
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            LEFT JOIN brands b ON b.id = p.brand_id
            WHERE s.status = 'COMPLETED'
            GROUP BY COALESCE(b.name, 'Sem Marca')
            ORDER BY profit DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn profit_ranking_merges_products_with_the_same_name(pool: PgPool) {
        let mut ids = Vec::new();
        for cost in [40, 60] {
            let id: Uuid = sqlx::query_scalar(
                "INSERT INTO products (name, cost_price, selling_price) VALUES ('Malbec', $1, 100) RETURNING id",
            )
            .bind(Decimal::new(cost, 0))
            .fetch_one(&pool)
            .await
            .unwrap();
            ids.push(id);
        }

        let sale_id: Uuid = sqlx::query_scalar("INSERT INTO sales (status, total) VALUES ('COMPLETED', 200) RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
        for product_id in &ids {
            sqlx::query("INSERT INTO sale_items (sale_id, product_id, quantity, price, subtotal) VALUES ($1, $2, 1, 100, 100)")
                .bind(sale_id)
                .bind(product_id)
                .execute(&pool)
                .await
                .unwrap();
        }

        let ranking = FinanceRepository::new().top_products_by_profit(&pool, 10).await.unwrap();

        // (100 - 40) + (100 - 60)
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].name, "Malbec");
        assert_eq!(ranking[0].profit, Decimal::new(100, 0));
    }
}
