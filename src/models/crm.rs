// src/models/crm.rs

use chrono::{DateTime, Utc, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema, Default)]
#[sqlx(type_name = "customer_classification", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "snake_case")]
pub enum CustomerClassification {
    #[default]
    New,
    Recurring,
    Vip,
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Maria Souza")]
    pub name: String,
    // Sempre formatado: 000.000.000-00 ou 00.000.000/0000-00
    #[schema(example = "529.982.247-25")]
    pub cpf_cnpj: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub phone: String,
    pub email: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1990-05-20")]
    pub birth_date: Option<NaiveDate>,

    // Endereço
    pub zip_code: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,

    // Preferências (nomes das famílias olfativas)
    #[schema(example = json!(["Amadeirado", "Cítrico"]))]
    pub fragrance_preferences: Vec<String>,
    #[schema(example = "Chanel, Dior")]
    pub favorite_brands: String,

    pub loyalty_points: i32,
    pub classification: CustomerClassification,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resultado enxuto da busca do PDV
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLookup {
    pub id: Uuid,
    pub name: String,
    pub cpf_cnpj: Option<String>,
    pub phone: String,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    #[schema(example = "Maria Souza")]
    pub name: String,

    // Aceita com ou sem máscara; validado e formatado no serviço
    #[schema(example = "52998224725")]
    pub cpf_cnpj: Option<String>,

    #[validate(length(max = 20, message = "Telefone muito longo."))]
    #[serde(default)]
    pub phone: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    #[schema(value_type = Option<String>, format = Date, example = "1990-05-20")]
    pub birth_date: Option<NaiveDate>,

    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 2, message = "Use a sigla do estado (UF)."))]
    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub fragrance_preferences: Vec<String>,
    #[serde(default)]
    pub favorite_brands: String,

    #[validate(range(min = 0, message = "Os pontos não podem ser negativos."))]
    #[serde(default)]
    pub loyalty_points: i32,
    #[serde(default)]
    pub classification: CustomerClassification,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_minimum_is_a_name() {
        let payload: CustomerPayload =
            serde_json::from_value(serde_json::json!({ "name": "Ana" })).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.classification, CustomerClassification::New);
        assert!(payload.fragrance_preferences.is_empty());
    }

    #[test]
    fn payload_rejects_bad_email_and_state() {
        let payload: CustomerPayload = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "nao-e-email",
            "state": "SPX"
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("state"));
    }
}
