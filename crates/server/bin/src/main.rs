//! Confluent Gateway
//!
//! Consumes self-service requests and provisions topics, service accounts and
//! schemas in Confluent Cloud.

mod startup;

use clap::Parser;
use confluent_gateway_shared::config::{ConfigLoader, LogFormat, LoggingConfig};
use std::path::PathBuf;

/// CLI arguments for confluent-gateway
#[derive(clap::Parser, Debug)]
#[command(name = "confluent-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Confluent Cloud provisioning gateway", long_about = None)]
struct Args {
    /// Load environment variables from this file before reading the configuration
    #[arg(long, env = "CG_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(args.env_file).load_gateway_config()?;

    setup_logging(&config.logging, args.debug)?;

    startup::run(config).await
}

/// `RUST_LOG` wins over the configured level; `--debug` overrides both.
fn setup_logging(config: &LoggingConfig, debug: bool) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_env_file_and_debug() {
        let args = Args::parse_from(["confluent-gateway", "--env-file", ".env.local", "-d"]);

        assert_eq!(args.env_file, Some(PathBuf::from(".env.local")));
        assert!(args.debug);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["confluent-gateway"]).unwrap();

        assert!(!args.debug);
    }
}
