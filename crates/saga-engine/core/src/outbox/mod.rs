//! # Transactional Outbox
//!
//! Stages outgoing domain events in the same transaction as the state change
//! that caused them. A separate relay later publishes undelivered entries.
//!
//! 1. Message types are registered once against a `(topic, event type)` pair
//! 2. [`TransactionalOutbox::produce`] resolves the registration by the
//!    message's runtime type, wraps it in an [`Envelope`] and writes one
//!    [`OutboxEntry`] through the caller's open transaction
//! 3. The entry is durable iff that transaction commits
//!
//! No network I/O happens while producing.

pub mod envelope;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub use envelope::Envelope;

/// A domain event that can be staged in the outbox.
pub trait OutgoingMessage: Serialize + Send + Sync + 'static {
    /// Key used to partition the message downstream.
    fn partition_key(&self) -> String;
}

/// Row staged in the outbox table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub topic: String,
    pub partition_key: String,
    /// Serialized [`Envelope`]
    pub payload: String,
    pub occurred_at: DateTime<Utc>,
    /// `None` until the relay has published the entry
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}

/// Write side of the outbox, implemented by the ambient transaction.
#[async_trait]
pub trait OutboxWriter: Send {
    async fn add_to_outbox(&mut self, entry: OutboxEntry) -> Result<(), OutboxError>;
}

/// Read side of the outbox used by the relay.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Error type for repository operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Oldest unprocessed entries first.
    async fn get_unprocessed(&self, batch_size: usize) -> Result<Vec<OutboxEntry>, Self::Error>;

    async fn mark_processed(&self, id: Uuid) -> Result<(), Self::Error>;

    async fn unprocessed_count(&self) -> Result<u64, Self::Error>;
}

/// Outbox error.
#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("Message type {type_name} is already registered")]
    AlreadyRegistered { type_name: &'static str },

    #[error("Message type {type_name} is not registered")]
    NotRegistered { type_name: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Write error: {0}")]
    Write(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Registration {
    topic: String,
    event_type: String,
}

/// Registry of outgoing message types plus the producer that stages them.
#[derive(Debug, Default)]
pub struct TransactionalOutbox {
    registrations: HashMap<TypeId, Registration>,
}

impl TransactionalOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates message type `M` with a topic and event type.
    pub fn register<M: OutgoingMessage>(
        &mut self,
        topic: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Result<(), OutboxError> {
        let key = TypeId::of::<M>();
        if self.registrations.contains_key(&key) {
            return Err(OutboxError::AlreadyRegistered {
                type_name: type_name::<M>(),
            });
        }

        self.registrations.insert(
            key,
            Registration {
                topic: topic.into(),
                event_type: event_type.into(),
            },
        );
        Ok(())
    }

    /// Topic and event type registered for `M`, if any.
    pub fn registration<M: OutgoingMessage>(&self) -> Option<(&str, &str)> {
        self.registrations
            .get(&TypeId::of::<M>())
            .map(|r| (r.topic.as_str(), r.event_type.as_str()))
    }

    /// Stages `message` through `writer` and returns the new entry's id.
    pub async fn produce<W, M>(&self, writer: &mut W, message: &M) -> Result<Uuid, OutboxError>
    where
        W: OutboxWriter + ?Sized,
        M: OutgoingMessage,
    {
        let registration =
            self.registrations
                .get(&TypeId::of::<M>())
                .ok_or(OutboxError::NotRegistered {
                    type_name: type_name::<M>(),
                })?;

        let id = Uuid::new_v4();
        let envelope = Envelope::new(id.to_string(), registration.event_type.clone(), message);
        let entry = OutboxEntry {
            id,
            topic: registration.topic.clone(),
            partition_key: message.partition_key(),
            payload: serde_json::to_string(&envelope)?,
            occurred_at: Utc::now(),
            processed_at: None,
        };

        writer.add_to_outbox(entry).await?;

        debug!(
            message_id = %id,
            topic = %registration.topic,
            event_type = %registration.event_type,
            "Message staged in outbox"
        );

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct SomethingHappened {
        thing_id: String,
    }

    impl OutgoingMessage for SomethingHappened {
        fn partition_key(&self) -> String {
            self.thing_id.clone()
        }
    }

    #[derive(Debug, Serialize)]
    struct NeverRegistered;

    impl OutgoingMessage for NeverRegistered {
        fn partition_key(&self) -> String {
            String::new()
        }
    }

    #[derive(Default)]
    struct VecWriter {
        entries: Vec<OutboxEntry>,
    }

    #[async_trait]
    impl OutboxWriter for VecWriter {
        async fn add_to_outbox(&mut self, entry: OutboxEntry) -> Result<(), OutboxError> {
            self.entries.push(entry);
            Ok(())
        }
    }

    fn outbox() -> TransactionalOutbox {
        let mut outbox = TransactionalOutbox::new();
        outbox
            .register::<SomethingHappened>("test.topic", "something-happened")
            .unwrap();
        outbox
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut outbox = outbox();
        let err = outbox
            .register::<SomethingHappened>("other.topic", "other")
            .unwrap_err();

        assert!(matches!(err, OutboxError::AlreadyRegistered { .. }));
        assert_eq!(
            outbox.registration::<SomethingHappened>(),
            Some(("test.topic", "something-happened"))
        );
    }

    #[tokio::test]
    async fn test_produce_writes_envelope_entry() {
        let outbox = outbox();
        let mut writer = VecWriter::default();

        let id = outbox
            .produce(
                &mut writer,
                &SomethingHappened {
                    thing_id: "t-1".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(writer.entries.len(), 1);
        let entry = &writer.entries[0];
        assert_eq!(entry.id, id);
        assert_eq!(entry.topic, "test.topic");
        assert_eq!(entry.partition_key, "t-1");
        assert!(!entry.is_processed());

        let payload: serde_json::Value = serde_json::from_str(&entry.payload).unwrap();
        assert_eq!(payload["messageId"], id.to_string());
        assert_eq!(payload["type"], "something-happened");
        assert_eq!(payload["data"]["thingId"], "t-1");
    }

    #[tokio::test]
    async fn test_produce_unregistered_type_fails_without_writing() {
        let outbox = outbox();
        let mut writer = VecWriter::default();

        let err = outbox.produce(&mut writer, &NeverRegistered).await.unwrap_err();

        assert!(matches!(err, OutboxError::NotRegistered { .. }));
        assert!(writer.entries.is_empty());
    }
}
