//! Consumer for the self-service topics.
//!
//! Offsets are committed explicitly once a message has been handled (or
//! deliberately skipped), so an unhandled message is redelivered after a
//! restart.

use super::{MessagingError, client_config};
use confluent_gateway_shared::config::KafkaConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, info};

/// Owned copy of a received record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    /// Empty for tombstones
    pub payload: Vec<u8>,
}

pub struct MessageConsumer {
    consumer: StreamConsumer,
}

/// Creates a consumer subscribed to `topics` with auto-commit disabled.
pub fn create_consumer(
    config: &KafkaConfig,
    topics: &[&str],
) -> Result<MessageConsumer, MessagingError> {
    let consumer: StreamConsumer = client_config(config)
        .set("group.id", &config.group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .create()?;

    consumer.subscribe(topics)?;
    info!(group_id = %config.group_id, ?topics, "Kafka consumer subscribed");

    Ok(MessageConsumer { consumer })
}

impl MessageConsumer {
    /// Waits for the next record.
    pub async fn recv(&self) -> Result<ConsumedMessage, MessagingError> {
        let message = self.consumer.recv().await?;

        Ok(ConsumedMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(|k| k.to_vec()),
            payload: message.payload().map(|p| p.to_vec()).unwrap_or_default(),
        })
    }

    /// Commits the offset following `message`.
    pub fn commit(&self, message: &ConsumedMessage) -> Result<(), MessagingError> {
        let commit_error = |message_text: String| MessagingError::Commit {
            topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
            message: message_text,
        };

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.offset + 1),
        )
        .map_err(|e| commit_error(e.to_string()))?;

        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| commit_error(e.to_string()))?;

        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Offset committed"
        );
        Ok(())
    }
}
