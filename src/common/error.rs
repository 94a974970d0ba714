// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;
use crate::models::sales::SaleStatus;

// Erros de domínio. A tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Nome já cadastrado: {0}")]
    NameAlreadyExists(String),

    #[error("Código de barras já cadastrado")]
    BarcodeAlreadyExists,

    #[error("Documento inválido: {0}")]
    InvalidDocument(String),

    #[error("CPF/CNPJ já cadastrado")]
    DocumentAlreadyExists,

    #[error("Produto {0} não é um kit")]
    NotAKit(Uuid),

    #[error("Componente de kit inválido: {0}")]
    InvalidKitComponent(String),

    #[error("Quantidade fracionada no componente {component} do kit {kit}")]
    FractionalKitQuantity { kit: Uuid, component: Uuid },

    #[error("A venda precisa de pelo menos um item")]
    EmptySale,

    #[error("Registro em uso: {0}")]
    ResourceInUse(String),

    #[error("Venda {} não pode ser alterada", .0.label_pt())]
    SaleNotEditable(SaleStatus),

    #[error("Transição inválida de {} para {}", .from.label_pt(), .to.label_pt())]
    InvalidSaleTransition { from: SaleStatus, to: SaleStatus },

    #[error("Valor inválido: {0}")]
    InvalidAmount(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Resposta de erro já traduzida, pronta para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidDocument(_)
            | AppError::NotAKit(_)
            | AppError::InvalidKitComponent(_)
            | AppError::FractionalKitQuantity { .. }
            | AppError::EmptySale
            | AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists
            | AppError::UsernameAlreadyExists
            | AppError::NameAlreadyExists(_)
            | AppError::BarcodeAlreadyExists
            | AppError::DocumentAlreadyExists
            | AppError::ResourceInUse(_)
            | AppError::SaleNotEditable(_)
            | AppError::InvalidSaleTransition { .. } => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let pt = locale.is_portuguese();
        let status = self.status();

        let error = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let message = if pt {
                    "Um ou mais campos são inválidos."
                } else {
                    "One or more fields are invalid."
                };
                return ApiError {
                    status,
                    error: message.to_string(),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => pick(pt, "Este e-mail já está em uso.", "This e-mail is already in use."),
            AppError::UsernameAlreadyExists => pick(pt, "Este nome de usuário já está em uso.", "This username is already taken."),
            AppError::InvalidCredentials => pick(pt, "E-mail ou senha inválidos.", "Invalid e-mail or password."),
            AppError::InvalidToken => pick(pt, "Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
            AppError::UserNotFound => pick(pt, "Usuário não encontrado.", "User not found."),
            AppError::ResourceNotFound(what) => {
                if pt { format!("{} não encontrado(a).", what) } else { format!("{} not found.", what) }
            }
            AppError::NameAlreadyExists(name) => {
                if pt { format!("'{}' já está cadastrado.", name) } else { format!("'{}' already exists.", name) }
            }
            AppError::BarcodeAlreadyExists => pick(pt, "Código de barras já cadastrado.", "Barcode already registered."),
            AppError::InvalidDocument(reason) => reason.clone(),
            AppError::DocumentAlreadyExists => pick(pt, "CPF/CNPJ já cadastrado.", "CPF/CNPJ already registered."),
            AppError::NotAKit(_) => pick(pt, "O produto informado não é um kit.", "The given product is not a kit."),
            AppError::InvalidKitComponent(reason) => reason.clone(),
            AppError::FractionalKitQuantity { .. } => pick(
                pt,
                "A quantidade vendida gera uma baixa fracionada em um componente do kit.",
                "The sold quantity produces a fractional deduction on a kit component.",
            ),
            AppError::EmptySale => pick(pt, "A venda precisa de pelo menos um item.", "A sale needs at least one item."),
            AppError::ResourceInUse(what) => {
                if pt {
                    format!("{} está em uso e não pode ser excluído(a).", what)
                } else {
                    format!("{} is in use and cannot be deleted.", what)
                }
            }
            AppError::SaleNotEditable(status) => {
                if pt {
                    format!("Somente vendas pendentes podem ser alteradas (status atual: {}).", status.label_pt())
                } else {
                    format!("Only pending sales can be changed (current status: {:?}).", status)
                }
            }
            AppError::InvalidSaleTransition { from, to } => {
                if pt {
                    format!("Não é possível mudar a venda de {} para {}.", from.label_pt(), to.label_pt())
                } else {
                    format!("Cannot move the sale from {:?} to {:?}.", from, to)
                }
            }
            AppError::InvalidAmount(reason) => reason.clone(),
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                pick(pt, "Ocorreu um erro inesperado.", "An unexpected error occurred.")
            }
        };

        ApiError { status, error, details: None }
    }

    // Violação de chave estrangeira (ex.: produto já vendido) vira ResourceInUse.
    pub fn on_foreign_key_violation(e: sqlx::Error, what: &str) -> AppError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_foreign_key_violation() {
                return AppError::ResourceInUse(what.to_string());
            }
        }
        AppError::DatabaseError(e)
    }

    // Converte violação de chave única em um erro amigável; o resto vira DatabaseError.
    pub fn on_unique_violation(e: sqlx::Error, conflict: impl FnOnce(Option<&str>) -> AppError) -> AppError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return conflict(db_err.constraint());
            }
        }
        AppError::DatabaseError(e)
    }
}

fn pick(pt: bool, pt_message: &str, en_message: &str) -> String {
    if pt { pt_message.to_string() } else { en_message.to_string() }
}

// Sem idioma disponível (ex.: rejeição de extrator), respondemos em português.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_http_status() {
        assert_eq!(AppError::EmptySale.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DocumentAlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ResourceNotFound("Venda".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidSaleTransition { from: SaleStatus::Canceled, to: SaleStatus::Completed }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_follow_locale() {
        let pt = AppError::EmptySale.to_api_error(&Locale("pt".into()));
        let en = AppError::EmptySale.to_api_error(&Locale("en".into()));
        assert_eq!(pt.error, "A venda precisa de pelo menos um item.");
        assert_eq!(en.error, "A sale needs at least one item.");
    }

    #[test]
    fn sale_status_errors_render_portuguese_labels() {
        let transition = AppError::InvalidSaleTransition { from: SaleStatus::Canceled, to: SaleStatus::Completed };
        assert_eq!(transition.to_string(), "Transição inválida de Cancelada para Finalizada");
        assert_eq!(
            AppError::SaleNotEditable(SaleStatus::Completed).to_string(),
            "Venda Finalizada não pode ser alterada"
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let api = AppError::DatabaseError(sqlx::Error::PoolTimedOut).to_api_error(&Locale("en".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        errors.add("value", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()));
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["value"][0], "O valor não pode ser negativo.");
    }
}
