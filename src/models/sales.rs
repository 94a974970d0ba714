// src/models/sales.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{validate_not_negative, validate_positive};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,   // Orçamento / reserva
    Completed, // Finalizada
    Canceled,  // Cancelada
}

impl SaleStatus {
    /// pending -> completed | canceled, completed -> canceled.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Pending, SaleStatus::Completed)
                | (SaleStatus::Pending, SaleStatus::Canceled)
                | (SaleStatus::Completed, SaleStatus::Canceled)
        )
    }

    pub fn label_pt(self) -> &'static str {
        match self {
            SaleStatus::Pending => "Pendente",
            SaleStatus::Completed => "Finalizada",
            SaleStatus::Canceled => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Pix,
    Credit,
    Debit,
    Cash,
}

impl PaymentMethod {
    pub fn label_pt(self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Credit => "Crédito",
            PaymentMethod::Debit => "Débito",
            PaymentMethod::Cash => "Dinheiro",
        }
    }
}

// Desconto/acréscimo: valor fixo (R$) ou percentual sobre o subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "adjustment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    #[default]
    Fixed,
    Percent,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(example = 1024)]
    pub number: i64,
    pub salesperson_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    #[schema(example = 1)]
    pub installments: i32,
    #[schema(example = "10.00")]
    pub discount_value: Decimal,
    pub discount_type: AdjustmentType,
    #[schema(example = "0.00")]
    pub tax_value: Decimal,
    pub tax_type: AdjustmentType,
    #[schema(example = "289.90")]
    pub total: Decimal,
    #[schema(example = "14.50")]
    pub commission: Decimal,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
    // Preço congelado no momento da venda
    #[schema(example = "149.90")]
    pub price: Decimal,
    #[schema(example = "299.80")]
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item: SaleItem,
    pub product_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub header: Sale,
    pub customer_name: Option<String>,
    pub salesperson_name: Option<String>,
    pub items: Vec<SaleItemDetail>,
    // Soma das receitas vinculadas à venda
    pub amount_paid: Decimal,
    pub remaining: Decimal,
}

// Linha da listagem de vendas (cabeçalho + nomes)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub header: Sale,
    pub customer_name: Option<String>,
    pub amount_paid: Decimal,
    pub remaining: Decimal,
}

// --- Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser pelo menos 1."))]
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    // Cliente cadastrado...
    pub customer_id: Option<Uuid>,
    // ...ou cliente avulso (criado só com o nome)
    #[schema(example = "Maria Souza")]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default = "default_installments")]
    #[validate(range(min = 1, max = 24, message = "Parcelas devem estar entre 1 e 24."))]
    pub installments: i32,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub discount_value: Decimal,
    #[serde(default)]
    pub discount_type: AdjustmentType,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub tax_value: Decimal,
    #[serde(default)]
    pub tax_type: AdjustmentType,

    // pending (orçamento, reserva estoque) ou completed (baixa definitiva)
    #[serde(default = "default_status")]
    #[validate(custom(function = "validate_initial_status"))]
    pub status: SaleStatus,

    #[validate(length(min = 1, message = "A venda precisa de pelo menos um item."), nested)]
    pub items: Vec<SaleItemPayload>,
}

fn default_installments() -> i32 {
    1
}

fn default_status() -> SaleStatus {
    SaleStatus::Pending
}

/// Uma venda nasce pendente ou finalizada, nunca cancelada.
pub fn validate_initial_status(status: &SaleStatus) -> Result<(), ValidationError> {
    if *status == SaleStatus::Canceled {
        let mut err = ValidationError::new("status");
        err.message = Some("Uma venda não pode ser criada já cancelada.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleAdjustmentsPayload {
    pub payment_method: PaymentMethod,

    #[validate(range(min = 1, max = 24, message = "Parcelas devem estar entre 1 e 24."))]
    pub installments: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub discount_value: Decimal,
    pub discount_type: AdjustmentType,

    #[validate(custom(function = "validate_not_negative"))]
    pub tax_value: Decimal,
    pub tax_type: AdjustmentType,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPaymentPayload {
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "100.00")]
    pub amount: Decimal,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SaleListQuery {
    pub status: Option<SaleStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_status_transitions() {
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Completed));
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Canceled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Canceled));

        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Canceled.can_transition_to(SaleStatus::Completed));
        assert!(!SaleStatus::Canceled.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Pending.can_transition_to(SaleStatus::Pending));
    }

    #[test]
    fn create_payload_defaults() {
        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::nil(), "quantity": 2 }]
        }))
        .unwrap();

        assert_eq!(payload.status, SaleStatus::Pending);
        assert_eq!(payload.payment_method, PaymentMethod::Pix);
        assert_eq!(payload.installments, 1);
        assert_eq!(payload.discount_type, AdjustmentType::Fixed);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn create_payload_rejects_empty_items_and_zero_quantity() {
        let empty: CreateSalePayload =
            serde_json::from_value(serde_json::json!({ "items": [] })).unwrap();
        assert!(empty.validate().is_err());

        let zero: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::nil(), "quantity": 0 }]
        }))
        .unwrap();
        let errors = zero.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn sale_item_payload_serializes_in_camel_case() {
        let item = SaleItemPayload { product_id: Uuid::nil(), quantity: 2 };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["productId"], serde_json::json!(Uuid::nil()));
        assert_eq!(json["quantity"], 2);
    }

    #[test]
    fn create_payload_rejects_canceled_status() {
        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "status": "canceled",
            "items": [{ "productId": Uuid::nil(), "quantity": 1 }]
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("status"));
    }
}
