//! Configuration module for Confluent Gateway
//!
//! Centralized configuration loading, validation and DTOs.
//!
//! 1. **Single Source of Truth**: configuration is loaded once at startup
//! 2. **Fail Fast**: missing or malformed values are reported immediately
//! 3. **DTO Pattern**: configuration is immutable and passed by injection
//!
//! # Environment Variables
//!
//! ## Required
//!
//! - `CG_DATABASE_URL`: PostgreSQL connection string
//! - `CG_CLOUD_API_USERNAME`, `CG_CLOUD_API_PASSWORD`: Confluent Cloud API key
//! - `CG_KAFKA_BROKERS`: Kafka bootstrap servers
//!
//! ## Optional
//!
//! - `CG_CLOUD_API_URL`, `CG_HTTP_TIMEOUT_SECS`
//! - `CG_DB_POOL_SIZE`, `CG_DB_CONNECT_TIMEOUT_SECS`
//! - `CG_KAFKA_GROUP_ID`, `CG_KAFKA_USERNAME`, `CG_KAFKA_PASSWORD`
//! - `CG_VAULT_REGION`
//! - `CG_RELAY_POLL_INTERVAL_MS`, `CG_RELAY_BATCH_SIZE`
//! - `CG_LOG_LEVEL`, `CG_LOG_FORMAT`, `RUST_LOG`

pub mod dto;
pub mod error;
pub mod loader;
pub mod validator;

pub use dto::{
    ConfluentConfig, DatabaseConfig, GatewayConfig, KafkaConfig, LogFormat, LoggingConfig,
    RelayConfig, VaultConfig,
};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, DEFAULT_CLOUD_API_URL};
pub use validator::{
    validate_database_url, validate_gateway_config, validate_http_url, validate_pool_config,
};
