// src/db/settings_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{CompanySettings, PaymentMethodConfig, UpdateSettingsRequest},
};

#[derive(Clone, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Linha única de configurações; criada com os valores padrão se ainda não existe.
    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<CompanySettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, CompanySettings>(
            r#"
            WITH ensured AS (
                INSERT INTO company_settings (id) VALUES (1)
                ON CONFLICT (id) DO NOTHING
                RETURNING *
            )
            SELECT name, cnpj, state_registration, address, phone, email, website, updated_at FROM ensured
            UNION ALL
            SELECT name, cnpj, state_registration, address, phone, email, website, updated_at
            FROM company_settings WHERE id = 1
            LIMIT 1
            "#,
        )
        .fetch_one(executor)
        .await?;
        Ok(settings)
    }

    // UPSERT: campos ausentes mantêm o valor atual (ou o padrão da tabela)
    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        input: &UpdateSettingsRequest,
    ) -> Result<CompanySettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, CompanySettings>(
            r#"
            INSERT INTO company_settings (id) VALUES (1)
            ON CONFLICT (id) DO UPDATE SET
                name = COALESCE($1, company_settings.name),
                cnpj = COALESCE($2, company_settings.cnpj),
                state_registration = COALESCE($3, company_settings.state_registration),
                address = COALESCE($4, company_settings.address),
                phone = COALESCE($5, company_settings.phone),
                email = COALESCE($6, company_settings.email),
                website = COALESCE($7, company_settings.website),
                updated_at = NOW()
            RETURNING name, cnpj, state_registration, address, phone, email, website, updated_at
            "#,
        )
        .bind(input.name.as_deref())
        .bind(input.cnpj.as_deref())
        .bind(input.state_registration.as_deref())
        .bind(input.address.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(input.website.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(settings)
    }

    // --- Formas de pagamento ---

    pub async fn list_payment_methods<'e, E>(&self, executor: E) -> Result<Vec<PaymentMethodConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let methods = sqlx::query_as::<_, PaymentMethodConfig>(
            "SELECT id, name, active FROM payment_method_configs ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(methods)
    }

    pub async fn create_payment_method<'e, E>(
        &self,
        executor: E,
        name: &str,
        active: bool,
    ) -> Result<PaymentMethodConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let method = sqlx::query_as::<_, PaymentMethodConfig>(
            "INSERT INTO payment_method_configs (name, active) VALUES ($1, $2) RETURNING id, name, active",
        )
        .bind(name)
        .bind(active)
        .fetch_one(executor)
        .await?;
        Ok(method)
    }

    pub async fn toggle_payment_method<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<PaymentMethodConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let method = sqlx::query_as::<_, PaymentMethodConfig>(
            "UPDATE payment_method_configs SET active = NOT active WHERE id = $1 RETURNING id, name, active",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(method)
    }
}
