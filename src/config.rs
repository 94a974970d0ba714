// src/config.rs

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CrmRepository, FinanceRepository, InventoryRepository, ReportRepository, SalesRepository,
        SettingsRepository, UserRepository,
    },
    services::{
        auth::AuthService, crm_service::CrmService, finance_service::FinanceService,
        inventory_service::InventoryService, pricing::DEFAULT_COMMISSION_RATE, report_service::ReportService,
        sales_service::SalesService,
    },
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Variáveis de ambiente da aplicação (.env carregado pelo dotenvy)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub commission_rate: Decimal,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (facilita os testes).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{}'", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let commission_rate = match lookup("COMMISSION_RATE") {
            Some(raw) => Decimal::from_str(raw.trim())
                .with_context(|| format!("COMMISSION_RATE inválido: '{}'", raw))?,
            None => DEFAULT_COMMISSION_RATE,
        };
        if commission_rate.is_sign_negative() || commission_rate > Decimal::ONE {
            anyhow::bail!("COMMISSION_RATE deve estar entre 0 e 1 (recebido {})", commission_rate);
        }

        Ok(Self { database_url, jwt_secret, bind_addr, db_max_connections, commission_rate })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,

    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub crm_service: CrmService,
    pub sales_service: SalesService,
    pub finance_service: FinanceService,
    pub report_service: ReportService,
    pub settings_repo: SettingsRepository,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: Config) -> Self {
        let auth_service = AuthService::new(UserRepository::new(), config.jwt_secret.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(InventoryRepository::new());
        let crm_service = CrmService::new(CrmRepository::new());
        let sales_service = SalesService::new(
            SalesRepository::new(),
            InventoryRepository::new(),
            CrmRepository::new(),
            FinanceRepository::new(),
            config.commission_rate,
        );
        let finance_service = FinanceService::new(FinanceRepository::new());
        let report_service = ReportService::new(ReportRepository::new(), FinanceRepository::new());

        Self {
            db_pool,
            config,
            auth_service,
            inventory_service,
            crm_service,
            sales_service,
            finance_service,
            report_service,
            settings_repo: SettingsRepository::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/loja"), ("JWT_SECRET", "s")]))
            .unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.db_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.commission_rate, Decimal::new(5, 2));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/loja"),
            ("JWT_SECRET", "s"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("COMMISSION_RATE", "0.08"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.db_max_connections, 12);
        assert_eq!(config.commission_rate, Decimal::new(8, 2));
    }

    #[test]
    fn requires_database_url_and_secret() {
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).is_err());
    }

    #[test]
    fn rejects_bad_numbers() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")];

        let bad_pool = [base[0], base[1], ("DB_MAX_CONNECTIONS", "muitos")];
        assert!(Config::from_lookup(lookup(&bad_pool)).is_err());

        let bad_rate = [base[0], base[1], ("COMMISSION_RATE", "1.5")];
        assert!(Config::from_lookup(lookup(&bad_rate)).is_err());
    }
}
