// src/services/finance_service.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FinanceRepository,
    models::finance::{FinanceDashboard, FinancialReports, Transaction, TransactionKind, TransactionPayload},
};

/// Quantos produtos/marcas entram no ranking de lucro.
pub const TOP_PROFIT_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct FinanceService {
    finance_repo: FinanceRepository,
}

impl FinanceService {
    pub fn new(finance_repo: FinanceRepository) -> Self {
        Self { finance_repo }
    }

    // ---
    // Lançamentos
    // ---

    pub async fn create_transaction<'e, E>(
        &self,
        executor: E,
        payload: TransactionPayload,
        today: NaiveDate,
    ) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payload = payload.with_payment_date_defaulted(today);
        let transaction = self.finance_repo.create_transaction(executor, &payload).await?;

        tracing::info!(
            transaction_id = %transaction.id,
            kind = ?transaction.kind,
            value = %transaction.value,
            "💵 Lançamento criado: {}",
            transaction.description
        );
        Ok(transaction)
    }

    pub async fn update_transaction<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: TransactionPayload,
        today: NaiveDate,
    ) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payload = payload.with_payment_date_defaulted(today);
        self.finance_repo
            .update_transaction(executor, id, &payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lançamento".into()))
    }

    pub async fn get_transaction<'e, E>(&self, executor: E, id: Uuid) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.finance_repo
            .find_transaction(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Lançamento".into()))
    }

    pub async fn delete_transaction<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.finance_repo.delete_transaction(executor, id).await? {
            return Err(AppError::ResourceNotFound("Lançamento".into()));
        }
        Ok(())
    }

    pub async fn list_transactions<'e, E>(&self, executor: E) -> Result<Vec<Transaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.finance_repo.list_transactions(executor).await
    }

    // ---
    // Painel e indicadores
    // ---

    /// Totais pagos, saldo, contas em aberto e recebíveis vencidos.
    pub async fn dashboard<'a, A>(&self, conn: A, today: NaiveDate) -> Result<FinanceDashboard, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let totals = self.finance_repo.paid_totals(&mut *conn).await?;
        let payables = self.finance_repo.list_open(&mut *conn, TransactionKind::Expense).await?;
        let receivables = self.finance_repo.list_open(&mut *conn, TransactionKind::Income).await?;
        let overdue = self.finance_repo.list_overdue_receivables(&mut *conn, today).await?;

        Ok(FinanceDashboard {
            total_income: totals.total_income,
            total_expense: totals.total_expense,
            balance: totals.total_income - totals.total_expense,
            payables,
            receivables,
            overdue,
        })
    }

    pub async fn financial_reports<'a, A>(&self, conn: A) -> Result<FinancialReports, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let avg_ticket = self.finance_repo.average_ticket(&mut *conn).await?;
        let top_products = self.finance_repo.top_products_by_profit(&mut *conn, TOP_PROFIT_LIMIT).await?;
        let top_brands = self.finance_repo.top_brands_by_profit(&mut *conn, TOP_PROFIT_LIMIT).await?;

        Ok(FinancialReports { avg_ticket, top_products, top_brands })
    }
}
