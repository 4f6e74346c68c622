// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{MemoryStore, PgStore, TraceStore},
    services::{
        auth::PasswordHasher, fixtures::SeedFixtures, ConsistencyReporter, SeedPlanner,
    },
};

// Senha dos usuários de demonstração quando SEED_DEFAULT_PASSWORD não vem.
const DEFAULT_SEED_PASSWORD: &str = "herbtrace-demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("STORE_BACKEND inválido: '{}' (use postgres ou memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub store_backend: StoreBackend,
    pub bcrypt_cost: u32,
    pub seed_default_password: String,

    // Lido só para que um .env compartilhado funcione; não usado aqui.
    pub jwt_secret: Option<String>,
    pub health_addr: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("BCRYPT_COST inválido: '{}'", value))?,
            None => bcrypt::DEFAULT_COST,
        }
        .clamp(4, 31);

        Ok(Self {
            database_url: lookup("DATABASE_URL"),
            store_backend,
            bcrypt_cost,
            seed_default_password: lookup("SEED_DEFAULT_PASSWORD")
                .unwrap_or_else(|| DEFAULT_SEED_PASSWORD.to_string()),
            jwt_secret: lookup("JWT_SECRET"),
            health_addr: lookup("HEALTH_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }

    /// Store em memória e bcrypt no custo mínimo.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            store_backend: StoreBackend::Memory,
            bcrypt_cost: 4,
            seed_default_password: DEFAULT_SEED_PASSWORD.to_string(),
            jwt_secret: None,
            health_addr: "127.0.0.1:0".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<PgPool>,
    pub store: Arc<dyn TraceStore>,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        match config.store_backend {
            StoreBackend::Postgres => {
                let database_url = config
                    .database_url
                    .clone()
                    .context("DATABASE_URL deve ser definida")?;

                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(&database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!().run(&db_pool).await?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                let store: Arc<dyn TraceStore> = Arc::new(PgStore::new(db_pool.clone()));
                let mut state = Self::with_store(config, store);
                state.db_pool = Some(db_pool);
                Ok(state)
            }
            StoreBackend::Memory => {
                tracing::warn!("⚠️ STORE_BACKEND=memory: nada será persistido");
                let store: Arc<dyn TraceStore> = Arc::new(MemoryStore::new());
                Ok(Self::with_store(config, store))
            }
        }
    }

    /// Monta o estado sobre um store já pronto (testes, dry-run).
    pub fn with_store(config: AppConfig, store: Arc<dyn TraceStore>) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Self { config: Arc::new(config), db_pool: None, store, hasher }
    }

    pub fn seed_planner(&self, fixtures: SeedFixtures) -> SeedPlanner {
        SeedPlanner::new(
            self.store.clone(),
            self.hasher.clone(),
            self.config.seed_default_password.clone(),
            fixtures,
        )
    }

    pub fn reporter(&self) -> ConsistencyReporter {
        ConsistencyReporter::new(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.health_addr, "0.0.0.0:3000");
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn bcrypt_cost_is_clamped() {
        let low = AppConfig::from_lookup(lookup(&[("BCRYPT_COST", "1")])).unwrap();
        assert_eq!(low.bcrypt_cost, 4);
        let high = AppConfig::from_lookup(lookup(&[("BCRYPT_COST", "40")])).unwrap();
        assert_eq!(high.bcrypt_cost, 31);
        assert!(AppConfig::from_lookup(lookup(&[("BCRYPT_COST", "abc")])).is_err());
    }

    #[test]
    fn memory_backend_is_selectable() {
        let config = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "Memory")])).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "redis")])).is_err());
    }
}
