//! # Create topic
//!
//! Provisions everything a capability needs to use a new topic:
//!
//! 1. `ensure_service_account`
//! 2. `ensure_service_account_acl` (one ACL entry per attempt)
//! 3. `ensure_service_account_api_key`
//! 4. `ensure_service_account_api_key_are_stored_in_vault`
//! 5. `ensure_topic_is_created`
//!
//! Progress lives in the flags of [`CreateProcess`].
//!
//! A crash after the platform created the topic but before the attempt
//! committed makes the retry call create-topic again. The outcome then
//! depends on how the platform treats a duplicate create.

use super::acl::{EnsureServiceAccountAclStep, ensure_service_account_acl};
use super::{SagaContext, SagaPerformer, SagaServices, SagaState, SagaSteps};
use async_trait::async_trait;
use confluent_gateway_domain::{
    AclEntry, ApiKeyDestination, ClusterAccess, CreateProcess, Database, DomainError,
    DomainResult, PersistenceError, TopicProvisioned, TopicProvisioningBegun, TopicRequested,
    TopicSpec, UnitOfWork,
};
use saga_engine_core::step::StepsBuilder;
use std::sync::Arc;
use tracing::{debug, info, instrument};

type Context = SagaContext<CreateProcess>;

// =============================================================================
// Steps
// =============================================================================

#[async_trait]
pub trait EnsureServiceAccountStep: Send {
    fn has_service_account(&self) -> bool;
    async fn create_service_account(&mut self) -> DomainResult<()>;
    fn mark_service_account_ready(&mut self);
}

pub async fn ensure_service_account<C: EnsureServiceAccountStep>(ctx: &mut C) -> DomainResult<()> {
    if ctx.has_service_account() {
        return Ok(());
    }

    ctx.create_service_account().await?;
    ctx.mark_service_account_ready();
    Ok(())
}

#[async_trait]
pub trait EnsureServiceAccountApiKeyStep: Send {
    fn has_api_key(&self) -> bool;
    async fn create_api_key(&mut self) -> DomainResult<()>;
    fn mark_api_key_ready(&mut self);
}

pub async fn ensure_service_account_api_key<C: EnsureServiceAccountApiKeyStep>(
    ctx: &mut C,
) -> DomainResult<()> {
    if ctx.has_api_key() {
        return Ok(());
    }

    ctx.create_api_key().await?;
    ctx.mark_api_key_ready();
    Ok(())
}

#[async_trait]
pub trait EnsureApiKeyStoredInVaultStep: Send {
    fn has_api_key_in_vault(&self) -> bool;
    async fn store_api_key_in_vault(&mut self) -> DomainResult<()>;
    fn mark_api_key_in_vault_ready(&mut self);
}

pub async fn ensure_service_account_api_key_are_stored_in_vault<C>(
    ctx: &mut C,
) -> DomainResult<()>
where
    C: EnsureApiKeyStoredInVaultStep,
{
    if ctx.has_api_key_in_vault() {
        return Ok(());
    }

    ctx.store_api_key_in_vault().await?;
    ctx.mark_api_key_in_vault_ready();
    Ok(())
}

#[async_trait]
pub trait EnsureTopicCreatedStep: Send {
    fn is_completed(&self) -> bool;
    async fn create_topic(&mut self) -> DomainResult<()>;
    /// Completes the process and stages `TopicProvisioned`.
    async fn mark_as_completed(&mut self) -> DomainResult<()>;
}

pub async fn ensure_topic_is_created<C: EnsureTopicCreatedStep>(ctx: &mut C) -> DomainResult<()> {
    if ctx.is_completed() {
        return Ok(());
    }

    ctx.create_topic().await?;
    ctx.mark_as_completed().await
}

// =============================================================================
// Context
// =============================================================================

#[async_trait]
impl SagaState for CreateProcess {
    async fn save(&self, uow: &mut dyn UnitOfWork) -> Result<(), PersistenceError> {
        uow.update_create_process(self).await
    }
}

#[async_trait]
impl EnsureServiceAccountStep for Context {
    fn has_service_account(&self) -> bool {
        self.state.has_service_account
    }

    async fn create_service_account(&mut self) -> DomainResult<()> {
        self.services
            .account
            .create_service_account(&mut *self.uow, &self.state.capability_id, &self.state.cluster_id)
            .await
    }

    fn mark_service_account_ready(&mut self) {
        self.state.has_service_account = true;
    }
}

#[async_trait]
impl EnsureServiceAccountAclStep for Context {
    fn has_cluster_access(&self) -> bool {
        self.state.has_cluster_access
    }

    async fn get_or_create_cluster_access(&mut self) -> DomainResult<ClusterAccess> {
        self.services
            .account
            .get_or_create_cluster_access(
                &mut *self.uow,
                &self.state.capability_id,
                &self.state.cluster_id,
            )
            .await
    }

    async fn create_acl_entry(
        &mut self,
        access: &ClusterAccess,
        entry: &AclEntry,
    ) -> DomainResult<()> {
        self.services
            .account
            .create_acl_entry(&mut *self.uow, access, entry)
            .await
    }

    fn mark_cluster_access_ready(&mut self) {
        self.state.has_cluster_access = true;
    }
}

#[async_trait]
impl EnsureServiceAccountApiKeyStep for Context {
    fn has_api_key(&self) -> bool {
        self.state.has_api_key
    }

    async fn create_api_key(&mut self) -> DomainResult<()> {
        let access = self
            .services
            .account
            .get_cluster_access(&mut *self.uow, &self.state.capability_id, &self.state.cluster_id)
            .await?;
        if access.has_api_key() {
            debug!(api_key = %access.api_key.username, "Reusing cluster API key");
            return Ok(());
        }

        self.services
            .account
            .create_cluster_api_key(&mut *self.uow, &self.state.capability_id, &self.state.cluster_id)
            .await
            .map(|_| ())
    }

    fn mark_api_key_ready(&mut self) {
        self.state.has_api_key = true;
    }
}

#[async_trait]
impl EnsureApiKeyStoredInVaultStep for Context {
    fn has_api_key_in_vault(&self) -> bool {
        self.state.has_api_key_in_vault
    }

    async fn store_api_key_in_vault(&mut self) -> DomainResult<()> {
        let access = self
            .services
            .account
            .get_cluster_access(&mut *self.uow, &self.state.capability_id, &self.state.cluster_id)
            .await?;

        self.services
            .vault
            .store_api_key(
                &self.state.capability_id,
                &self.state.cluster_id,
                ApiKeyDestination::Cluster,
                &access.api_key,
            )
            .await
    }

    fn mark_api_key_in_vault_ready(&mut self) {
        self.state.has_api_key_in_vault = true;
    }
}

#[async_trait]
impl EnsureTopicCreatedStep for Context {
    fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    async fn create_topic(&mut self) -> DomainResult<()> {
        let topic = self.state.to_topic();
        self.services.topic.create_topic(&mut *self.uow, &topic).await
    }

    async fn mark_as_completed(&mut self) -> DomainResult<()> {
        self.state.mark_as_completed();

        let event = TopicProvisioned {
            topic_id: self.state.topic_id.clone(),
            topic_name: self.state.topic_name.clone(),
            cluster_id: self.state.cluster_id.clone(),
            capability_id: self.state.capability_id.clone(),
        };
        self.services.outbox.produce(&mut *self.uow, &event).await?;
        Ok(())
    }
}

// =============================================================================
// Process
// =============================================================================

pub struct CreateTopicProcess {
    database: Arc<dyn Database>,
    services: SagaServices,
    steps: SagaSteps<CreateProcess>,
}

impl CreateTopicProcess {
    pub fn new(database: Arc<dyn Database>, services: SagaServices) -> Self {
        let steps = StepsBuilder::<Context, DomainError>::new()
            .step("ensure_service_account", |ctx| {
                Box::pin(ensure_service_account(ctx))
            })
            .step("ensure_service_account_acl", |ctx| {
                Box::pin(ensure_service_account_acl(ctx))
            })
            .until(|ctx| ctx.state.has_cluster_access)
            .step("ensure_service_account_api_key", |ctx| {
                Box::pin(ensure_service_account_api_key(ctx))
            })
            .step("ensure_service_account_api_key_are_stored_in_vault", |ctx| {
                Box::pin(ensure_service_account_api_key_are_stored_in_vault(ctx))
            })
            .step("ensure_topic_is_created", |ctx| {
                Box::pin(ensure_topic_is_created(ctx))
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
            capability_id = %request.capability_id,
            cluster_id = %request.cluster_id,
            topic_name = %request.topic_name,
        )
    )]
    pub async fn process(&self, request: &TopicRequested) -> DomainResult<()> {
        let Some(state) = self.prepare(request).await? else {
            info!("Topic already provisioned, nothing to do");
            return Ok(());
        };

        let mut performer = SagaPerformer::new(self.database.clone(), self.services.clone(), state);
        self.steps.run(&mut performer).await?;

        info!(topic_id = %request.topic_id, "Topic provisioned");
        Ok(())
    }

    /// Loads or starts the process, or `None` when the topic already exists.
    async fn prepare(&self, request: &TopicRequested) -> DomainResult<Option<CreateProcess>> {
        let mut uow = self.database.begin().await?;

        if uow
            .get_topic_by_name(&request.capability_id, &request.cluster_id, &request.topic_name)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let process = match uow
            .get_create_process(&request.capability_id, &request.cluster_id, &request.topic_name)
            .await?
        {
            Some(process) => process,
            None => {
                let process = CreateProcess::new(
                    request.capability_id.clone(),
                    request.cluster_id.clone(),
                    request.topic_id.clone(),
                    TopicSpec {
                        name: request.topic_name.clone(),
                        partitions: request.partitions,
                        retention_ms: request.retention,
                    },
                );
                uow.create_create_process(&process).await?;

                let event = TopicProvisioningBegun {
                    topic_id: process.topic_id.clone(),
                    topic_name: process.topic_name.clone(),
                    cluster_id: process.cluster_id.clone(),
                    capability_id: process.capability_id.clone(),
                };
                self.services.outbox.produce(&mut *uow, &event).await?;
                info!(process_id = %process.id, "Topic provisioning begun");
                process
            }
        };

        uow.commit().await?;
        Ok(Some(process))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FinalizationStub {
        completed: bool,
        platform_calls: usize,
        events: usize,
    }

    #[async_trait]
    impl EnsureTopicCreatedStep for FinalizationStub {
        fn is_completed(&self) -> bool {
            self.completed
        }

        async fn create_topic(&mut self) -> DomainResult<()> {
            self.platform_calls += 1;
            Ok(())
        }

        async fn mark_as_completed(&mut self) -> DomainResult<()> {
            self.completed = true;
            self.events += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_finalization_runs_once() {
        let mut ctx = FinalizationStub::default();

        ensure_topic_is_created(&mut ctx).await.unwrap();
        ensure_topic_is_created(&mut ctx).await.unwrap();

        assert_eq!(ctx.platform_calls, 1);
        assert_eq!(ctx.events, 1);
    }

    #[tokio::test]
    async fn test_finalization_on_completed_state_does_nothing() {
        let mut ctx = FinalizationStub {
            completed: true,
            ..Default::default()
        };

        ensure_topic_is_created(&mut ctx).await.unwrap();
        ensure_topic_is_created(&mut ctx).await.unwrap();

        assert_eq!(ctx.platform_calls, 0);
        assert_eq!(ctx.events, 0);
    }

    #[derive(Default)]
    struct FlagStub {
        has_service_account: bool,
        created: usize,
    }

    #[async_trait]
    impl EnsureServiceAccountStep for FlagStub {
        fn has_service_account(&self) -> bool {
            self.has_service_account
        }

        async fn create_service_account(&mut self) -> DomainResult<()> {
            self.created += 1;
            Ok(())
        }

        fn mark_service_account_ready(&mut self) {
            self.has_service_account = true;
        }
    }

    #[tokio::test]
    async fn test_service_account_step_skips_when_flag_is_set() {
        let mut ctx = FlagStub::default();

        ensure_service_account(&mut ctx).await.unwrap();
        ensure_service_account(&mut ctx).await.unwrap();

        assert_eq!(ctx.created, 1);
        assert!(ctx.has_service_account);
    }
}
