//! Message dispatcher
//!
//! Routes an inbound `{messageId, type, data}` envelope to the handler
//! registered for its `type`, deserializing `data` into the handler's
//! message type. Handlers are stored type-erased, keyed by message type.

use crate::handlers::{
    MessageContractRequestedHandler, MessageHandler, ServiceAccountAccessRequestedHandler,
    TopicDeletionRequestedHandler, TopicRequestedHandler,
};
use crate::saga::{
    CreateTopicProcess, DeleteTopicProcess, SagaServices, SchemaRegistrationProcess,
    ServiceAccountProcess,
};
use async_trait::async_trait;
use confluent_gateway_domain::{
    Database, DomainError, MessageContractRequested, ServiceAccountAccessRequested,
    TopicDeletionRequested, TopicRequested,
};
use confluent_gateway_shared::event_types;
use saga_engine_core::outbox::Envelope;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("Invalid {message_type} payload: {source}")]
    InvalidPayload {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Handler for {message_type} failed: {source}")]
    Handler {
        message_type: String,
        #[source]
        source: DomainError,
    },

    #[error("A handler for {message_type} is already registered")]
    AlreadyRegistered { message_type: String },
}

impl DispatchError {
    /// The message can never be handled and redelivering it is pointless.
    pub fn is_poison(&self) -> bool {
        matches!(
            self,
            Self::MalformedEnvelope(_) | Self::InvalidPayload { .. }
        )
    }
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn handle_value(&self, data: serde_json::Value) -> Result<(), DispatchError>;
}

struct HandlerWrapper<M, H> {
    message_type: String,
    handler: H,
    _phantom: PhantomData<fn() -> M>,
}

#[async_trait]
impl<M, H> ErasedHandler for HandlerWrapper<M, H>
where
    M: DeserializeOwned + Send + 'static,
    H: MessageHandler<M> + 'static,
{
    async fn handle_value(&self, data: serde_json::Value) -> Result<(), DispatchError> {
        let message: M =
            serde_json::from_value(data).map_err(|source| DispatchError::InvalidPayload {
                message_type: self.message_type.clone(),
                source,
            })?;

        self.handler
            .handle(message)
            .await
            .map_err(|source| DispatchError::Handler {
                message_type: self.message_type.clone(),
                source,
            })
    }
}

/// Outcome of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    Handled { message_id: String },
    Skipped { message_type: String },
}

#[derive(Default)]
pub struct MessageDispatcher {
    handlers: HashMap<String, Arc<dyn ErasedHandler>>,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M, H>(
        &mut self,
        message_type: impl Into<String>,
        handler: H,
    ) -> Result<(), DispatchError>
    where
        M: DeserializeOwned + Send + 'static,
        H: MessageHandler<M> + 'static,
    {
        let message_type = message_type.into();
        if self.handlers.contains_key(&message_type) {
            return Err(DispatchError::AlreadyRegistered { message_type });
        }

        let wrapper = HandlerWrapper::<M, H> {
            message_type: message_type.clone(),
            handler,
            _phantom: PhantomData,
        };
        self.handlers.insert(message_type, Arc::new(wrapper));
        Ok(())
    }

    pub fn handles(&self, message_type: &str) -> bool {
        self.handlers.contains_key(message_type)
    }

    /// Unknown message types are logged and skipped.
    pub async fn dispatch(&self, payload: &[u8]) -> Result<Dispatched, DispatchError> {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_slice(payload).map_err(DispatchError::MalformedEnvelope)?;

        let Some(handler) = self.handlers.get(&envelope.message_type) else {
            warn!(
                message_id = %envelope.message_id,
                message_type = %envelope.message_type,
                "No handler registered, skipping message"
            );
            return Ok(Dispatched::Skipped {
                message_type: envelope.message_type,
            });
        };

        debug!(
            message_id = %envelope.message_id,
            message_type = %envelope.message_type,
            "Dispatching message"
        );
        handler.handle_value(envelope.data).await?;

        Ok(Dispatched::Handled {
            message_id: envelope.message_id,
        })
    }
}

/// Dispatcher wired with every gateway saga.
pub fn gateway_dispatcher(
    database: Arc<dyn Database>,
    services: SagaServices,
) -> Result<MessageDispatcher, DispatchError> {
    let create = Arc::new(CreateTopicProcess::new(database.clone(), services.clone()));
    let delete = Arc::new(DeleteTopicProcess::new(database.clone(), services.clone()));
    let schema = Arc::new(SchemaRegistrationProcess::new(database.clone(), services.clone()));
    let access = Arc::new(ServiceAccountProcess::new(database, services));

    let mut dispatcher = MessageDispatcher::new();
    dispatcher.register::<TopicRequested, _>(
        event_types::TOPIC_REQUESTED,
        TopicRequestedHandler::new(create),
    )?;
    dispatcher.register::<TopicDeletionRequested, _>(
        event_types::TOPIC_DELETION_REQUESTED,
        TopicDeletionRequestedHandler::new(delete),
    )?;
    dispatcher.register::<MessageContractRequested, _>(
        event_types::MESSAGE_CONTRACT_REQUESTED,
        MessageContractRequestedHandler::new(schema),
    )?;
    dispatcher.register::<ServiceAccountAccessRequested, _>(
        event_types::CLUSTER_ACCESS_REQUESTED,
        ServiceAccountAccessRequestedHandler::new(access),
    )?;
    Ok(dispatcher)
}
