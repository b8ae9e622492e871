//! PostgreSQL persistence
//!
//! One [`PgPool`] is created at startup and shared by the unit of work
//! factory, the outbox relay repository and the cluster catalog.
//!
//! # Usage
//!
//! ```ignore
//! let database = PostgresDatabase::connect(&config.database).await?;
//! database.migrate().await?;
//!
//! let outbox = PgOutboxRepository::new(database.pool().clone());
//! let catalog = PgClusterCatalog::new(database.pool().clone());
//! ```

pub mod catalog;
pub mod outbox;
mod rows;
mod schema;
pub mod unit_of_work;

pub use catalog::PgClusterCatalog;
pub use outbox::PgOutboxRepository;
pub use unit_of_work::PgUnitOfWork;

use async_trait::async_trait;
use confluent_gateway_domain::{Database, PersistenceError, UnitOfWork};
use confluent_gateway_shared::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

pub(crate) fn database_error(err: sqlx::Error) -> PersistenceError {
    PersistenceError::Database(err.to_string())
}

/// Unit of work factory backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the shared pool.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        info!(
            "Creating PostgreSQL pool (max={}, timeout={}s)",
            config.pool_size, config.connect_timeout_secs
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.url)
            .await
            .map_err(database_error)?;

        info!("PostgreSQL pool created successfully");
        Ok(Self { pool })
    }

    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the gateway tables when missing.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(database_error)?;
        }
        info!(statements = schema::STATEMENTS.len(), "Database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, PersistenceError> {
        let tx = self.pool.begin().await.map_err(database_error)?;
        Ok(Box::new(PgUnitOfWork::new(tx)))
    }
}
