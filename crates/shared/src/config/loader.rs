//! Configuration loader
//!
//! This module provides the ConfigLoader which is responsible for loading
//! configuration from .env files and environment variables.

use std::path::Path;

use super::dto::{
    ConfluentConfig, DatabaseConfig, GatewayConfig, KafkaConfig, LogFormat, LoggingConfig,
    RelayConfig, VaultConfig,
};
use super::error::{ConfigError, Result};
use super::validator::validate_gateway_config;

/// Default Confluent Cloud control-plane URL
pub const DEFAULT_CLOUD_API_URL: &str = "https://api.confluent.cloud";

/// Configuration loader
///
/// Loads configuration from:
/// 1. .env file (optional)
/// 2. Environment variables
///
/// Values from the .env file only fill variables that are not already set in
/// the process environment.
///
/// # Example
///
/// ```ignore
/// use confluent_gateway_shared::config::ConfigLoader;
/// use std::path::PathBuf;
///
/// let loader = ConfigLoader::new(Some(PathBuf::from(".env")));
/// let config = loader.load_gateway_config()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Optional path to .env file
    env_file_path: Option<std::path::PathBuf>,
}

impl ConfigLoader {
    /// Create a new ConfigLoader
    pub fn new(env_file_path: Option<std::path::PathBuf>) -> Self {
        Self { env_file_path }
    }

    /// Load and validate the gateway configuration
    ///
    /// # Returns
    ///
    /// `Ok(GatewayConfig)` if configuration is valid and complete
    /// `Err(ConfigError)` if required configuration is missing or invalid
    pub fn load_gateway_config(&self) -> Result<GatewayConfig> {
        if let Some(path) = &self.env_file_path {
            self.load_env_file(path)?;
        }

        let config = GatewayConfig::from_env()?;
        validate_gateway_config(&config)?;

        Ok(config)
    }

    fn load_env_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ConfigError::EnvFileLoad {
                path: path.to_path_buf(),
                source: dotenv::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                )),
            });
        }

        dotenv::from_path(path).map_err(|e| ConfigError::EnvFileLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

// ============================================================================
// Implementation: GatewayConfig::from_env
// ============================================================================

impl GatewayConfig {
    /// Build the gateway configuration from environment variables
    ///
    /// # Required Environment Variables
    ///
    /// - `CG_DATABASE_URL`: PostgreSQL connection string
    /// - `CG_CLOUD_API_USERNAME` / `CG_CLOUD_API_PASSWORD`: Confluent Cloud API key
    /// - `CG_KAFKA_BROKERS`: Kafka bootstrap servers
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            confluent: ConfluentConfig::from_env()?,
            kafka: KafkaConfig::from_env()?,
            vault: VaultConfig::from_env(),
            relay: RelayConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    /// # Optional Variables
    ///
    /// - `CG_DB_POOL_SIZE`: Default 10
    /// - `CG_DB_CONNECT_TIMEOUT_SECS`: Default 30
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: required_var("CG_DATABASE_URL")?,
            pool_size: parse_optional_var("CG_DB_POOL_SIZE", 10)?,
            connect_timeout_secs: parse_optional_var("CG_DB_CONNECT_TIMEOUT_SECS", 30)?,
        })
    }
}

impl ConfluentConfig {
    /// # Optional Variables
    ///
    /// - `CG_CLOUD_API_URL`: Default [`DEFAULT_CLOUD_API_URL`]
    /// - `CG_HTTP_TIMEOUT_SECS`: Default 30
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cloud_api_url: std::env::var("CG_CLOUD_API_URL")
                .unwrap_or_else(|_| DEFAULT_CLOUD_API_URL.to_string()),
            cloud_api_username: required_var("CG_CLOUD_API_USERNAME")?,
            cloud_api_password: required_var("CG_CLOUD_API_PASSWORD")?,
            http_timeout_secs: parse_optional_var("CG_HTTP_TIMEOUT_SECS", 30)?,
        })
    }
}

impl KafkaConfig {
    /// # Optional Variables
    ///
    /// - `CG_KAFKA_GROUP_ID`: Default "confluent-gateway"
    /// - `CG_KAFKA_USERNAME` / `CG_KAFKA_PASSWORD`: SASL credentials
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            brokers: required_var("CG_KAFKA_BROKERS")?,
            group_id: std::env::var("CG_KAFKA_GROUP_ID")
                .unwrap_or_else(|_| "confluent-gateway".to_string()),
            username: std::env::var("CG_KAFKA_USERNAME").ok(),
            password: std::env::var("CG_KAFKA_PASSWORD").ok(),
        })
    }
}

impl VaultConfig {
    pub fn from_env() -> Self {
        Self {
            region: std::env::var("CG_VAULT_REGION").ok(),
        }
    }
}

impl RelayConfig {
    /// # Optional Variables
    ///
    /// - `CG_RELAY_POLL_INTERVAL_MS`: Default 1000
    /// - `CG_RELAY_BATCH_SIZE`: Default 100
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            poll_interval_ms: parse_optional_var("CG_RELAY_POLL_INTERVAL_MS", 1000)?,
            batch_size: parse_optional_var("CG_RELAY_BATCH_SIZE", 100)?,
        })
    }
}

impl LoggingConfig {
    /// # Optional Variables
    ///
    /// - `CG_LOG_LEVEL`: Default "info"
    /// - `CG_LOG_FORMAT`: "text" or "json" (default: "text")
    pub fn from_env() -> Result<Self> {
        let level = std::env::var("CG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let format = match std::env::var("CG_LOG_FORMAT") {
            Err(_) => LogFormat::Text,
            Ok(value) => match value.to_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "CG_LOG_FORMAT".to_string(),
                        value,
                    });
                }
            },
        };

        Ok(Self { level, format })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn required_var(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| ConfigError::MissingRequired {
        var: var.to_string(),
    })
}

/// Parse optional environment variable with default value
///
/// A present but unparsable value is an error rather than a silent default.
fn parse_optional_var<T>(var: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
