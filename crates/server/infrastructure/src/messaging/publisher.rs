use super::{MessagingError, client_config};
use async_trait::async_trait;
use confluent_gateway_shared::config::KafkaConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use saga_engine_core::relay::OutboxPublisher;
use std::time::Duration;
use tracing::debug;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Publishes relayed outbox entries and waits for the broker's ack.
pub struct KafkaOutboxPublisher {
    producer: FutureProducer,
}

impl KafkaOutboxPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self, MessagingError> {
        let producer: FutureProducer = client_config(config)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("message.timeout.ms", DELIVERY_TIMEOUT.as_millis().to_string())
            .create()?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl OutboxPublisher for KafkaOutboxPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), String> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(DELIVERY_TIMEOUT))
            .await
            .map_err(|(err, _)| err.to_string())?;

        debug!(topic, key, partition, offset, "Delivered outbox message");
        Ok(())
    }
}
