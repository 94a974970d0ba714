// src/models/finance.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use chrono::{DateTime, Utc, NaiveDate};
use rust_decimal::Decimal;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::validate_positive;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,  // Receita
    Expense, // Despesa
}

impl TransactionKind {
    pub fn label_pt(self) -> &'static str {
        match self {
            TransactionKind::Income => "Receita",
            TransactionKind::Expense => "Despesa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending, // Aberto
    Paid,    // Quitado
    Overdue, // Atrasado
}

impl TransactionStatus {
    pub fn label_pt(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pendente",
            TransactionStatus::Paid => "Pago",
            TransactionStatus::Overdue => "Atrasado",
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,

    #[schema(example = "Pagamento Fornecedor XYZ")]
    pub description: String,

    pub kind: TransactionKind,

    #[schema(example = "500.00")]
    pub value: Decimal,

    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub due_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date, example = "2025-12-20")]
    pub payment_date: Option<NaiveDate>,

    pub status: TransactionStatus,

    // Vínculo opcional com a venda (rastreabilidade dos recebimentos)
    pub sale_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.kind == TransactionKind::Income
            && self.status == TransactionStatus::Pending
            && self.due_date < today
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceDashboard {
    // Apenas o que foi PAGO
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub payables: Vec<Transaction>,
    pub receivables: Vec<Transaction>,
    // Receitas pendentes já vencidas
    pub overdue: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfitEntry {
    pub name: String,
    pub profit: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReports {
    pub avg_ticket: Decimal,
    pub top_products: Vec<ProfitEntry>,
    pub top_brands: Vec<ProfitEntry>,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[validate(length(min = 1, max = 255, message = "A descrição é obrigatória."))]
    #[schema(example = "Aluguel da loja")]
    pub description: String,

    pub kind: TransactionKind,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "1500.00")]
    pub value: Decimal,

    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub due_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub payment_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: TransactionStatus,

    pub sale_id: Option<Uuid>,
}

impl TransactionPayload {
    /// Lançamento pago sem data de pagamento recebe a data de hoje.
    pub fn with_payment_date_defaulted(mut self, today: NaiveDate) -> Self {
        if self.status == TransactionStatus::Paid && self.payment_date.is_none() {
            self.payment_date = Some(today);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(status: TransactionStatus, payment_date: Option<NaiveDate>) -> TransactionPayload {
        TransactionPayload {
            description: "Aluguel".into(),
            kind: TransactionKind::Expense,
            value: Decimal::new(150000, 2),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            payment_date,
            status,
            sale_id: None,
        }
    }

    #[test]
    fn paid_without_date_gets_today() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 12).unwrap();

        let paid = payload(TransactionStatus::Paid, None).with_payment_date_defaulted(today);
        assert_eq!(paid.payment_date, Some(today));

        let explicit_day = NaiveDate::from_ymd_opt(2025, 2, 9).unwrap();
        let paid = payload(TransactionStatus::Paid, Some(explicit_day)).with_payment_date_defaulted(today);
        assert_eq!(paid.payment_date, Some(explicit_day));

        let pending = payload(TransactionStatus::Pending, None).with_payment_date_defaulted(today);
        assert_eq!(pending.payment_date, None);
    }

    #[test]
    fn value_must_be_positive() {
        let mut p = payload(TransactionStatus::Pending, None);
        p.value = Decimal::ZERO;
        assert!(p.validate().is_err());
    }

    #[test]
    fn overdue_only_for_pending_income_past_due() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut t = Transaction {
            id: Uuid::new_v4(),
            description: "Pagamento Venda #3".into(),
            kind: TransactionKind::Income,
            value: Decimal::new(100, 0),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            payment_date: None,
            status: TransactionStatus::Pending,
            sale_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(t.is_overdue(today));

        t.due_date = today;
        assert!(!t.is_overdue(today));

        t.due_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        t.kind = TransactionKind::Expense;
        assert!(!t.is_overdue(today));
    }
}
