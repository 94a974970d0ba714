// src/db/crm_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Customer, CustomerPayload},
};

#[derive(Clone, Default)]
pub struct CrmRepository;

impl CrmRepository {
    pub fn new() -> Self {
        Self
    }

    fn map_unique(e: sqlx::Error) -> AppError {
        // A única chave única de customers é o CPF/CNPJ
        AppError::on_unique_violation(e, |_| AppError::DocumentAlreadyExists)
    }

    /// Cria um cliente. `cpf_cnpj` já deve chegar normalizado.
    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        payload: &CustomerPayload,
        cpf_cnpj: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                name, cpf_cnpj, phone, email, birth_date, zip_code, street, number,
                complement, neighborhood, city, state, fragrance_preferences,
                favorite_brands, loyalty_points, classification
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(cpf_cnpj)
        .bind(&payload.phone)
        .bind(payload.email.as_deref())
        .bind(payload.birth_date)
        .bind(&payload.zip_code)
        .bind(&payload.street)
        .bind(&payload.number)
        .bind(&payload.complement)
        .bind(&payload.neighborhood)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.fragrance_preferences)
        .bind(&payload.favorite_brands)
        .bind(payload.loyalty_points)
        .bind(payload.classification)
        .fetch_one(executor)
        .await
        .map_err(Self::map_unique)
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &CustomerPayload,
        cpf_cnpj: Option<&str>,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $2, cpf_cnpj = $3, phone = $4, email = $5, birth_date = $6,
                zip_code = $7, street = $8, number = $9, complement = $10,
                neighborhood = $11, city = $12, state = $13, fragrance_preferences = $14,
                favorite_brands = $15, loyalty_points = $16, classification = $17,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.trim())
        .bind(cpf_cnpj)
        .bind(&payload.phone)
        .bind(payload.email.as_deref())
        .bind(payload.birth_date)
        .bind(&payload.zip_code)
        .bind(&payload.street)
        .bind(&payload.number)
        .bind(&payload.complement)
        .bind(&payload.neighborhood)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.fragrance_preferences)
        .bind(&payload.favorite_brands)
        .bind(payload.loyalty_points)
        .bind(payload.classification)
        .fetch_optional(executor)
        .await
        .map_err(Self::map_unique)
    }

    pub async fn find_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    // Mais recentes primeiro
    pub async fn list_customers<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
            .fetch_all(executor)
            .await?;
        Ok(customers)
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Cliente avulso do PDV: reaproveita o primeiro com o mesmo nome ou cria um novo
    /// só com o nome (telefone vazio).
    pub async fn find_or_create_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            WITH existing AS (
                SELECT * FROM customers WHERE name = $1 ORDER BY created_at ASC LIMIT 1
            ), created AS (
                INSERT INTO customers (name, phone)
                SELECT $1, '' WHERE NOT EXISTS (SELECT 1 FROM existing)
                RETURNING *
            )
            SELECT * FROM existing
            UNION ALL
            SELECT * FROM created
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }
}
