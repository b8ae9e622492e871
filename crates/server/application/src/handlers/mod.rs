//! Inbound message handlers
//!
//! Each handler turns one inbound message into one saga run.

use crate::saga::{
    CreateTopicProcess, DeleteTopicProcess, SchemaRegistrationProcess, ServiceAccountProcess,
};
use async_trait::async_trait;
use confluent_gateway_domain::{
    DomainResult, MessageContractRequested, ServiceAccountAccessRequested, TopicDeletionRequested,
    TopicRequested,
};
use std::sync::Arc;

#[async_trait]
pub trait MessageHandler<M: Send + 'static>: Send + Sync {
    async fn handle(&self, message: M) -> DomainResult<()>;
}

pub struct TopicRequestedHandler {
    process: Arc<CreateTopicProcess>,
}

impl TopicRequestedHandler {
    pub fn new(process: Arc<CreateTopicProcess>) -> Self {
        Self { process }
    }
}

#[async_trait]
impl MessageHandler<TopicRequested> for TopicRequestedHandler {
    async fn handle(&self, message: TopicRequested) -> DomainResult<()> {
        self.process.process(&message).await
    }
}

pub struct TopicDeletionRequestedHandler {
    process: Arc<DeleteTopicProcess>,
}

impl TopicDeletionRequestedHandler {
    pub fn new(process: Arc<DeleteTopicProcess>) -> Self {
        Self { process }
    }
}

#[async_trait]
impl MessageHandler<TopicDeletionRequested> for TopicDeletionRequestedHandler {
    async fn handle(&self, message: TopicDeletionRequested) -> DomainResult<()> {
        self.process.process(&message).await
    }
}

pub struct MessageContractRequestedHandler {
    process: Arc<SchemaRegistrationProcess>,
}

impl MessageContractRequestedHandler {
    pub fn new(process: Arc<SchemaRegistrationProcess>) -> Self {
        Self { process }
    }
}

#[async_trait]
impl MessageHandler<MessageContractRequested> for MessageContractRequestedHandler {
    async fn handle(&self, message: MessageContractRequested) -> DomainResult<()> {
        self.process.process(&message).await
    }
}

pub struct ServiceAccountAccessRequestedHandler {
    process: Arc<ServiceAccountProcess>,
}

impl ServiceAccountAccessRequestedHandler {
    pub fn new(process: Arc<ServiceAccountProcess>) -> Self {
        Self { process }
    }
}

#[async_trait]
impl MessageHandler<ServiceAccountAccessRequested> for ServiceAccountAccessRequestedHandler {
    async fn handle(&self, message: ServiceAccountAccessRequested) -> DomainResult<()> {
        self.process.process(&message).await
    }
}
