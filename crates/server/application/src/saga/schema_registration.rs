//! # Schema registration
//!
//! Single step `ensure_schema_is_registered`. Outcomes:
//!
//! - registered: process completed, `SchemaRegistered` staged
//! - rejected by the registry (4xx) or no registry for the cluster: process
//!   completed, `SchemaRegistrationFailed` staged, the step succeeds
//! - any other error: the step fails and the process stays open

use super::{SagaContext, SagaPerformer, SagaServices, SagaState, SagaSteps};
use async_trait::async_trait;
use confluent_gateway_domain::{
    ConfluentError, Database, DomainError, DomainResult, MessageContractRequested,
    PersistenceError, SchemaProcess, SchemaRegistered, SchemaRegistrationFailed, Topic,
    UnitOfWork,
};
use saga_engine_core::step::StepsBuilder;
use std::sync::Arc;
use tracing::{info, instrument, warn};

type Context = SagaContext<SchemaProcess>;

#[async_trait]
pub trait EnsureSchemaIsRegisteredStep: Send {
    fn is_completed(&self) -> bool;
    async fn get_topic(&mut self) -> DomainResult<Topic>;
    /// Subject registered for the process on `topic`.
    fn subject(&self, topic: &Topic) -> String;
    async fn register_schema(&mut self, topic: &Topic, subject: &str)
    -> Result<(), ConfluentError>;
    async fn mark_as_registered(&mut self) -> DomainResult<()>;
    async fn mark_as_failed(&mut self, reason: String) -> DomainResult<()>;
}

/// Rejections that end the process instead of being retried.
pub fn is_terminal_rejection(err: &ConfluentError) -> bool {
    matches!(err, ConfluentError::SchemaRegistryNotConfigured { .. }) || err.is_client_rejection()
}

pub async fn ensure_schema_is_registered<C>(ctx: &mut C) -> DomainResult<()>
where
    C: EnsureSchemaIsRegisteredStep,
{
    if ctx.is_completed() {
        return Ok(());
    }

    let topic = ctx.get_topic().await?;
    let subject = ctx.subject(&topic);

    match ctx.register_schema(&topic, &subject).await {
        Ok(()) => ctx.mark_as_registered().await,
        Err(e) if is_terminal_rejection(&e) => {
            warn!(subject = %subject, error = %e, "Schema registration rejected");
            ctx.mark_as_failed(e.to_string()).await
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SagaState for SchemaProcess {
    async fn save(&self, uow: &mut dyn UnitOfWork) -> Result<(), PersistenceError> {
        uow.update_schema_process(self).await
    }
}

#[async_trait]
impl EnsureSchemaIsRegisteredStep for Context {
    fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    async fn get_topic(&mut self) -> DomainResult<Topic> {
        self.uow
            .get_topic(&self.state.topic_id)
            .await?
            .ok_or_else(|| DomainError::TopicNotFound {
                topic_id: self.state.topic_id.clone(),
            })
    }

    fn subject(&self, topic: &Topic) -> String {
        self.state.subject(&topic.name)
    }

    async fn register_schema(
        &mut self,
        topic: &Topic,
        subject: &str,
    ) -> Result<(), ConfluentError> {
        self.services
            .schema
            .register_schema(&topic.cluster_id, subject, &self.state.schema)
            .await
    }

    async fn mark_as_registered(&mut self) -> DomainResult<()> {
        self.state.mark_as_completed();

        let event = SchemaRegistered {
            message_contract_id: self.state.message_contract_id.clone(),
            topic_id: self.state.topic_id.clone(),
        };
        self.services.outbox.produce(&mut *self.uow, &event).await?;
        Ok(())
    }

    async fn mark_as_failed(&mut self, reason: String) -> DomainResult<()> {
        self.state.mark_as_completed();

        let event = SchemaRegistrationFailed {
            message_contract_id: self.state.message_contract_id.clone(),
            topic_id: self.state.topic_id.clone(),
            reason,
        };
        self.services.outbox.produce(&mut *self.uow, &event).await?;
        Ok(())
    }
}

pub struct SchemaRegistrationProcess {
    database: Arc<dyn Database>,
    services: SagaServices,
    steps: SagaSteps<SchemaProcess>,
}

impl SchemaRegistrationProcess {
    pub fn new(database: Arc<dyn Database>, services: SagaServices) -> Self {
        let steps = StepsBuilder::<Context, DomainError>::new()
            .step("ensure_schema_is_registered", |ctx| {
                Box::pin(ensure_schema_is_registered(ctx))
            })
            .build();

        Self {
            database,
            services,
            steps,
        }
    }

    #[instrument(
        skip(self, request),
        fields(
            message_contract_id = %request.message_contract_id,
            topic_id = %request.topic_id,
        )
    )]
    pub async fn process(&self, request: &MessageContractRequested) -> DomainResult<()> {
        let state = self.prepare(request).await?;
        if state.is_completed() {
            info!("Schema process already completed");
            return Ok(());
        }

        let mut performer = SagaPerformer::new(self.database.clone(), self.services.clone(), state);
        self.steps.run(&mut performer).await
    }

    async fn prepare(&self, request: &MessageContractRequested) -> DomainResult<SchemaProcess> {
        let mut uow = self.database.begin().await?;

        let process = match uow.get_schema_process(&request.message_contract_id).await? {
            Some(process) => process,
            None => {
                let process = SchemaProcess::new(
                    request.message_contract_id.clone(),
                    request.topic_id.clone(),
                    request.message_type.clone(),
                    request.description.clone(),
                    request.schema.clone(),
                    request.schema_version,
                );
                uow.create_schema_process(&process).await?;
                process
            }
        };

        uow.commit().await?;
        Ok(process)
    }
}
