//! Kafka messaging
//!
//! - consumer: inbound self-service requests with manual offset commits
//! - publisher: outbox relay publisher

pub mod consumer;
pub mod publisher;

pub use consumer::{ConsumedMessage, MessageConsumer, create_consumer};
pub use publisher::KafkaOutboxPublisher;

use confluent_gateway_shared::config::KafkaConfig;
use rdkafka::ClientConfig;
use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Kafka client error: {0}")]
    Client(#[from] KafkaError),

    #[error("Offset commit failed for {topic}/{partition}@{offset}: {message}")]
    Commit {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },
}

/// Client settings shared by the consumer and the producer. SASL/PLAIN over
/// TLS is enabled when credentials are configured.
pub fn client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.brokers);

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client_config
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanism", "PLAIN")
            .set("sasl.username", username)
            .set("sasl.password", password);
    }

    client_config
}
