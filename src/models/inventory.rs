// src/models/inventory.rs

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{validate_not_negative, validate_positive};

/// Dias antes do vencimento em que o produto passa a "vencendo".
pub const EXPIRING_SOON_DAYS: i64 = 30;

// --- 1. Cadastros auxiliares ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Perfumaria")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: Uuid,
    #[schema(example = "Natura")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OlfactoryFamily {
    pub id: Uuid,
    #[schema(example = "Amadeirado")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[schema(example = "Distribuidora Aroma Ltda")]
    pub name: String,
    // CNPJ/CPF já formatado
    #[schema(example = "11.222.333/0001-81")]
    pub document: Option<String>,
    pub phone: String,
    pub email: String,
}

// --- 2. Produtos ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema, Default)]
#[sqlx(type_name = "product_kind", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "snake_case")] // JSON
pub enum ProductKind {
    #[default]
    Perfume,
    Decant,
    Kit, // Combo virtual: a baixa vai para os componentes
    Cosmetic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema, Default)]
#[sqlx(type_name = "product_gender", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum ProductGender {
    Male,
    Female,
    #[default]
    Unisex,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidityStatus {
    Undefined,
    Expired,
    ExpiringSoon,
    Ok,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Malbec Gold")]
    pub name: String,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub line: String,
    pub kind: ProductKind,
    pub gender: ProductGender,
    pub olfactory_family_id: Option<Uuid>,
    pub top_notes: String,
    pub heart_notes: String,
    pub base_notes: String,
    pub description: String,
    #[schema(example = "100ml")]
    pub volume: String,
    #[schema(example = "7891033000001")]
    pub barcode: Option<String>,
    pub batch_code: String,
    #[schema(value_type = Option<String>, format = Date, example = "2027-06-30")]
    pub expiration_date: Option<NaiveDate>,
    #[schema(example = "120.00")]
    pub cost_price: Decimal,
    #[schema(example = "199.90")]
    pub selling_price: Decimal,
    // Pode ficar negativo (venda sem estoque é permitida)
    pub stock_quantity: i32,
    pub min_stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_kit(&self) -> bool {
        self.kind == ProductKind::Kit
    }

    /// (venda - custo) / custo * 100, duas casas. Sem custo, 0.
    pub fn profit_margin(&self) -> Decimal {
        if self.cost_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((self.selling_price - self.cost_price) / self.cost_price * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn validity_status(&self, today: NaiveDate) -> ValidityStatus {
        match self.expiration_date {
            None => ValidityStatus::Undefined,
            Some(date) if date < today => ValidityStatus::Expired,
            Some(date) if (date - today).num_days() <= EXPIRING_SOON_DAYS => ValidityStatus::ExpiringSoon,
            Some(_) => ValidityStatus::Ok,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }
}

// Linha da listagem (produto + nomes relacionados + campos derivados)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub product: Product,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
    #[sqlx(skip)]
    pub profit_margin: Decimal,
    #[sqlx(skip)]
    pub validity_status: Option<ValidityStatus>,
}

// --- 3. Kits ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductComponent {
    pub id: Uuid,
    pub kit_id: Uuid,
    pub component_id: Uuid,
    #[schema(example = "2")]
    pub quantity: Decimal,
}

// Componente com o nome e estoque do produto (para telas e para o cálculo de baixa)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KitComponentDetail {
    pub id: Uuid,
    pub kit_id: Uuid,
    pub component_id: Uuid,
    pub component_name: String,
    pub component_stock: i32,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KitWithComponents {
    #[serde(flatten)]
    pub kit: Product,
    pub components: Vec<KitComponentDetail>,
}

// Resultado da busca do PDV
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosProduct {
    pub id: Uuid,
    pub name: String,
    pub barcode: Option<String>,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub is_kit: bool,
    // ["2x Decant Malbec", "1x Sabonete"]
    pub components: Vec<String>,
}

// --- 4. Movimentações de Estoque ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_movement_reason", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "snake_case")] // JSON
pub enum StockMovementReason {
    InitialStock,     // Vira "INITIAL_STOCK"
    Purchase,         // Vira "PURCHASE"
    Sale,             // Vira "SALE"
    SaleReservation,  // Vira "SALE_RESERVATION"
    SaleCancellation, // Vira "SALE_CANCELLATION"
    Return,
    Decant,
    Spoilage,
    Correction,
}

impl StockMovementReason {
    /// Motivos aceitos na movimentação manual; os de venda são exclusivos do PDV.
    pub fn is_manual(self) -> bool {
        matches!(
            self,
            StockMovementReason::Purchase
                | StockMovementReason::Return
                | StockMovementReason::Decant
                | StockMovementReason::Spoilage
                | StockMovementReason::Correction
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    // Positivo = entrada, negativo = saída
    #[schema(example = -2)]
    pub quantity_changed: i32,
    pub reason: StockMovementReason,
    #[schema(example = "Venda #12")]
    pub notes: Option<String>,
    pub sale_id: Option<Uuid>,
    pub sale_item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: StockMovement,
    pub product_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockOverview {
    pub recent_movements: Vec<StockMovementRow>,
    pub low_stock: Vec<Product>,
    pub expiring: Vec<Product>,
}

// --- 5. Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNamedPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório."))]
    #[schema(example = "Amadeirado")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    pub name: String,
    pub document: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
}

// Campos editáveis do produto. O estoque nunca é alterado por aqui.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    #[schema(example = "Malbec Gold")]
    pub name: String,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub kind: ProductKind,
    #[serde(default)]
    pub gender: ProductGender,
    pub olfactory_family_id: Option<Uuid>,
    #[serde(default)]
    pub top_notes: String,
    #[serde(default)]
    pub heart_notes: String,
    #[serde(default)]
    pub base_notes: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub volume: String,
    pub barcode: Option<String>,
    #[serde(default)]
    pub batch_code: String,
    #[schema(value_type = Option<String>, format = Date, example = "2027-06-30")]
    pub expiration_date: Option<NaiveDate>,
    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub selling_price: Decimal,
    #[serde(default = "default_min_stock")]
    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: i32,
    pub image_url: Option<String>,
}

fn default_min_stock() -> i32 {
    5
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[serde(flatten)]
    #[validate(nested)]
    pub product: ProductPayload,

    // Registrado como movimentação INITIAL_STOCK
    #[serde(default)]
    #[validate(range(min = 0, message = "O estoque inicial não pode ser negativo."))]
    pub initial_stock: i32,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    Entry,
    Exit,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementPayload {
    pub product_id: Uuid,
    pub direction: MovementDirection,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    #[validate(custom(function = "validate_manual_reason"))]
    pub reason: StockMovementReason,
    pub notes: Option<String>,
}

fn validate_manual_reason(reason: &StockMovementReason) -> Result<(), ValidationError> {
    if reason.is_manual() {
        return Ok(());
    }
    let mut err = ValidationError::new("reason");
    err.message = Some("Movimentações de venda são geradas apenas pelo PDV.".into());
    Err(err)
}

impl StockMovementPayload {
    pub fn signed_quantity(&self) -> i32 {
        match self.direction {
            MovementDirection::Entry => self.quantity,
            MovementDirection::Exit => -self.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KitPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    #[schema(example = "Kit Presente Dia das Mães")]
    pub name: String,
    #[validate(custom(function = "validate_not_negative"))]
    pub selling_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddKitComponentPayload {
    pub component_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "1")]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Texto livre (nome, código de barras, marca); ignora acentos.
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(cost: Decimal, selling: Decimal, expiration: Option<NaiveDate>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Malbec".into(),
            brand_id: None,
            category_id: None,
            supplier_id: None,
            line: String::new(),
            kind: ProductKind::Perfume,
            gender: ProductGender::Male,
            olfactory_family_id: None,
            top_notes: String::new(),
            heart_notes: String::new(),
            base_notes: String::new(),
            description: String::new(),
            volume: "100ml".into(),
            barcode: None,
            batch_code: String::new(),
            expiration_date: expiration,
            cost_price: cost,
            selling_price: selling,
            stock_quantity: 3,
            min_stock: 5,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn profit_margin_over_cost() {
        let p = product(Decimal::new(100, 0), Decimal::new(150, 0), None);
        assert_eq!(p.profit_margin(), Decimal::new(5000, 2));

        let p = product(Decimal::new(300, 0), Decimal::new(400, 0), None);
        assert_eq!(p.profit_margin(), Decimal::new(3333, 2));

        let free = product(Decimal::ZERO, Decimal::new(10, 0), None);
        assert_eq!(free.profit_margin(), Decimal::ZERO);
    }

    #[test]
    fn validity_status_windows() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let at = |days: i64| Some(today + chrono::Duration::days(days));

        assert_eq!(product(Decimal::ONE, Decimal::ONE, None).validity_status(today), ValidityStatus::Undefined);
        assert_eq!(product(Decimal::ONE, Decimal::ONE, at(-1)).validity_status(today), ValidityStatus::Expired);
        assert_eq!(product(Decimal::ONE, Decimal::ONE, at(0)).validity_status(today), ValidityStatus::ExpiringSoon);
        assert_eq!(product(Decimal::ONE, Decimal::ONE, at(30)).validity_status(today), ValidityStatus::ExpiringSoon);
        assert_eq!(product(Decimal::ONE, Decimal::ONE, at(31)).validity_status(today), ValidityStatus::Ok);
    }

    #[test]
    fn low_stock_includes_the_minimum() {
        let mut p = product(Decimal::ONE, Decimal::ONE, None);
        p.stock_quantity = 5;
        assert!(p.is_low_stock());
        p.stock_quantity = 6;
        assert!(!p.is_low_stock());
    }

    #[test]
    fn manual_movements_exclude_sale_reasons() {
        assert!(StockMovementReason::Purchase.is_manual());
        assert!(StockMovementReason::Spoilage.is_manual());
        assert!(!StockMovementReason::Sale.is_manual());
        assert!(!StockMovementReason::SaleReservation.is_manual());
        assert!(!StockMovementReason::InitialStock.is_manual());
    }

    #[test]
    fn movement_payload_rejects_sale_reason_and_signs_exit() {
        let mut payload = StockMovementPayload {
            product_id: Uuid::new_v4(),
            direction: MovementDirection::Exit,
            quantity: 3,
            reason: StockMovementReason::Spoilage,
            notes: None,
        };
        assert!(payload.validate().is_ok());
        assert_eq!(payload.signed_quantity(), -3);

        payload.reason = StockMovementReason::Sale;
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("reason"));
    }
}
