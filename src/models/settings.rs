// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Dados da empresa (linha única, id = 1)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    #[schema(example = "Perfumaria Essência Ltda")]
    pub name: String,

    #[schema(example = "11.222.333/0001-81")]
    pub cnpj: String,

    #[schema(example = "123.456.789.110")]
    pub state_registration: String,

    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub address: String,

    #[schema(example = "(11) 99999-8888")]
    pub phone: String,

    #[schema(example = "contato@minhaloja.com")]
    pub email: String,

    #[schema(example = "https://minhaloja.com")]
    pub website: String,

    pub updated_at: DateTime<Utc>,
}

// Campos ausentes mantêm o valor atual
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 255, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "Minha Nova Loja")]
    pub name: Option<String>,

    #[schema(example = "11.222.333/0001-81")]
    pub cnpj: Option<String>,

    pub state_registration: Option<String>,

    #[schema(example = "Av. Paulista, 1000")]
    pub address: Option<String>,

    pub phone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodConfig {
    pub id: Uuid,
    #[schema(example = "Cartão de Crédito")]
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethodPayload {
    #[validate(length(min = 1, max = 50, message = "O nome é obrigatório."))]
    #[schema(example = "Vale Presente")]
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
