//! Errors raised while reading `CG_*` variables into a [`GatewayConfig`].
//!
//! Every variant names the offending variable where there is one, so a
//! misconfigured deployment fails at startup with a message pointing at
//! the setting to fix.
//!
//! [`GatewayConfig`]: super::GatewayConfig

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not set")]
    MissingRequired { var: String },

    /// The variable is set but does not parse as the expected type.
    #[error("{var} has an unusable value: {value}")]
    InvalidValue { var: String, value: String },

    #[error("Cannot read environment file {path}: {source}")]
    EnvFileLoad {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    /// Database or Confluent Cloud endpoint that cannot be used.
    #[error("{var} is not a usable URL: {reason}")]
    InvalidUrl { var: String, reason: String },

    /// Settings that parse but contradict each other or the gateway's limits.
    #[error("Invalid gateway configuration: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_database_url_names_the_variable() {
        let err = ConfigError::MissingRequired {
            var: "CG_DATABASE_URL".to_string(),
        };

        assert_eq!(err.to_string(), "CG_DATABASE_URL is not set");
    }

    #[test]
    fn test_unparsable_relay_batch_size_shows_the_value() {
        let err = ConfigError::InvalidValue {
            var: "CG_RELAY_BATCH_SIZE".to_string(),
            value: "lots".to_string(),
        };

        assert_eq!(err.to_string(), "CG_RELAY_BATCH_SIZE has an unusable value: lots");
    }

    #[test]
    fn test_cloud_api_url_error_keeps_the_reason() {
        let err = ConfigError::InvalidUrl {
            var: "CG_CLOUD_API_URL".to_string(),
            reason: "missing http:// or https:// scheme".to_string(),
        };

        assert!(err.to_string().starts_with("CG_CLOUD_API_URL is not a usable URL"));
        assert!(err.to_string().ends_with("scheme"));
    }
}
