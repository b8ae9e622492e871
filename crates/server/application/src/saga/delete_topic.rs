//! # Delete topic
//!
//! 1. `ensure_topic_schemas_are_deleted`
//! 2. `ensure_topic_is_deleted`
//!
//! A topic without a local row is treated as already deleted.

use super::{SagaContext, SagaPerformer, SagaServices, SagaState, SagaSteps};
use async_trait::async_trait;
use confluent_gateway_domain::{
    Database, DeleteProcess, DomainError, DomainResult, PersistenceError, TopicDeleted,
    TopicDeletionRequested, UnitOfWork,
};
use saga_engine_core::step::StepsBuilder;
use std::sync::Arc;
use tracing::{info, instrument, warn};

type Context = SagaContext<DeleteProcess>;

#[async_trait]
impl SagaState for DeleteProcess {
    async fn save(&self, uow: &mut dyn UnitOfWork) -> Result<(), PersistenceError> {
        uow.update_delete_process(self).await
    }
}

async fn ensure_topic_schemas_are_deleted(ctx: &mut Context) -> DomainResult<()> {
    if ctx.state.is_completed() {
        return Ok(());
    }

    let Some(topic) = ctx.uow.get_topic(&ctx.state.topic_id).await? else {
        warn!(topic_id = %ctx.state.topic_id, "Topic row gone, skipping schema deletion");
        return Ok(());
    };

    ctx.services.schema.delete_schemas(&mut *ctx.uow, &topic).await
}

async fn ensure_topic_is_deleted(ctx: &mut Context) -> DomainResult<()> {
    if ctx.state.is_completed() {
        return Ok(());
    }

    match ctx.uow.get_topic(&ctx.state.topic_id).await? {
        Some(topic) => ctx.services.topic.delete_topic(&mut *ctx.uow, &topic).await?,
        None => warn!(topic_id = %ctx.state.topic_id, "Topic row already removed"),
    }

    ctx.state.mark_as_completed();

    let event = TopicDeleted {
        topic_id: ctx.state.topic_id.clone(),
    };
    ctx.services.outbox.produce(&mut *ctx.uow, &event).await?;
    Ok(())
}

pub struct DeleteTopicProcess {
    database: Arc<dyn Database>,
    services: SagaServices,
    steps: SagaSteps<DeleteProcess>,
}

impl DeleteTopicProcess {
    pub fn new(database: Arc<dyn Database>, services: SagaServices) -> Self {
        let steps = StepsBuilder::<Context, DomainError>::new()
            .step("ensure_topic_schemas_are_deleted", |ctx| {
                Box::pin(ensure_topic_schemas_are_deleted(ctx))
            })
            .step("ensure_topic_is_deleted", |ctx| {
                Box::pin(ensure_topic_is_deleted(ctx))
            })
            .build();

        Self {
            database,
            services,
            steps,
        }
    }

    #[instrument(skip(self, request), fields(topic_id = %request.topic_id))]
    pub async fn process(&self, request: &TopicDeletionRequested) -> DomainResult<()> {
        let Some(state) = self.prepare(request).await? else {
            warn!("Topic not found, treating it as already deleted");
            return Ok(());
        };

        let mut performer = SagaPerformer::new(self.database.clone(), self.services.clone(), state);
        self.steps.run(&mut performer).await?;

        info!("Topic deletion completed");
        Ok(())
    }

    async fn prepare(&self, request: &TopicDeletionRequested) -> DomainResult<Option<DeleteProcess>> {
        let mut uow = self.database.begin().await?;

        let Some(topic) = uow.get_topic(&request.topic_id).await? else {
            return Ok(None);
        };

        let process = match uow.get_delete_process(&topic.id).await? {
            Some(process) => process,
            None => {
                let process = DeleteProcess::new(&topic);
                uow.create_delete_process(&process).await?;
                process
            }
        };

        uow.commit().await?;
        Ok(Some(process))
    }
}
