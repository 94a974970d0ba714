// src/services/crm_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{documents::normalize_optional, error::AppError, text},
    db::CrmRepository,
    models::crm::{Customer, CustomerLookup, CustomerPayload},
};

/// Máximo de clientes devolvidos na busca do PDV.
pub const POS_CUSTOMER_LIMIT: usize = 10;

#[derive(Clone)]
pub struct CrmService {
    crm_repo: CrmRepository,
}

impl CrmService {
    pub fn new(crm_repo: CrmRepository) -> Self {
        Self { crm_repo }
    }

    pub async fn create_customer<'e, E>(&self, executor: E, payload: &CustomerPayload) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cpf_cnpj = normalize_optional(payload.cpf_cnpj.as_deref())?;
        let customer = self.crm_repo.create_customer(executor, payload, cpf_cnpj.as_deref()).await?;

        tracing::info!(customer_id = %customer.id, "🧑 Cliente cadastrado: {}", customer.name);
        Ok(customer)
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cpf_cnpj = normalize_optional(payload.cpf_cnpj.as_deref())?;
        self.crm_repo
            .update_customer(executor, id, payload, cpf_cnpj.as_deref())
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    pub async fn get_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.crm_repo
            .find_customer(executor, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.crm_repo.delete_customer(executor, id).await? {
            return Err(AppError::ResourceNotFound("Cliente".into()));
        }
        Ok(())
    }

    /// Lista (mais recentes primeiro), filtrando por nome ou CPF/CNPJ quando há busca.
    pub async fn list_customers<'e, E>(&self, executor: E, query: Option<&str>) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = self.crm_repo.list_customers(executor).await?;
        let query = query.unwrap_or_default().trim();

        Ok(customers.into_iter().filter(|c| matches_customer(c, query)).collect())
    }

    // Busca do PDV: poucos campos e no máximo 10 resultados
    pub async fn search_for_pos<'e, E>(&self, executor: E, query: &str) -> Result<Vec<CustomerLookup>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = self.crm_repo.list_customers(executor).await?;
        let query = query.trim();

        Ok(customers
            .into_iter()
            .filter(|c| matches_customer(c, query))
            .take(POS_CUSTOMER_LIMIT)
            .map(|c| CustomerLookup { id: c.id, name: c.name, cpf_cnpj: c.cpf_cnpj, phone: c.phone })
            .collect())
    }
}

// Nome sem acento/caixa; documento também pelos dígitos ("529982" acha "529.982.247-25")
fn matches_customer(customer: &Customer, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    if text::matches_any(&text::normalize(query), &[Some(customer.name.as_str()), customer.cpf_cnpj.as_deref()]) {
        return true;
    }

    let query_digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();
    match (&customer.cpf_cnpj, query_digits.is_empty()) {
        (Some(doc), false) => doc.chars().filter(|c| c.is_ascii_digit()).collect::<String>().contains(&query_digits),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(name: &str, cpf_cnpj: Option<&str>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.into(),
            cpf_cnpj: cpf_cnpj.map(str::to_string),
            phone: String::new(),
            email: None,
            birth_date: None,
            zip_code: String::new(),
            street: String::new(),
            number: String::new(),
            complement: String::new(),
            neighborhood: String::new(),
            city: String::new(),
            state: String::new(),
            fragrance_preferences: Vec::new(),
            favorite_brands: String::new(),
            loyalty_points: 0,
            classification: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matches_name_without_accents() {
        let c = customer("Joana Araújo", None);
        assert!(matches_customer(&c, "araujo"));
        assert!(matches_customer(&c, "JOANA"));
        assert!(!matches_customer(&c, "maria"));
    }

    #[test]
    fn matches_document_with_or_without_mask() {
        let c = customer("Ana", Some("529.982.247-25"));
        assert!(matches_customer(&c, "52998224725"));
        assert!(matches_customer(&c, "529.982"));
        assert!(!matches_customer(&c, "111444"));
    }

    #[test]
    fn empty_query_lists_everyone() {
        assert!(matches_customer(&customer("Ana", None), "  ".trim()));
    }
}
