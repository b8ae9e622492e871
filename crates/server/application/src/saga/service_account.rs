//! # Cluster access grant
//!
//! Gives a capability's service account everything it needs on a cluster.
//! Each step checks live state (local rows, platform counts, secret store)
//! instead of persisted flags, so duplicate or concurrent grant requests
//! converge on the same result.
//!
//! 1. `ensure_service_account` (create, or link an account already named
//!    after the capability)
//! 2. `ensure_service_account_acl`
//! 3. `ensure_cluster_api_key`
//! 4. `ensure_cluster_api_key_is_stored_in_vault`
//! 5. `ensure_schema_registry_api_key`
//! 6. `ensure_schema_registry_role_binding`
//!
//! Steps 5 and 6 are skipped on clusters without a schema registry.

use super::acl::{EnsureServiceAccountAclStep, ensure_service_account_acl};
use super::{SagaContext, SagaPerformer, SagaServices, SagaState, SagaSteps};
use async_trait::async_trait;
use confluent_gateway_domain::{
    AclEntry, ApiKeyDestination, CapabilityId, ClusterAccess, ClusterId, Database, DomainError,
    DomainResult, PersistenceError, ServiceAccountAccessRequested, UnitOfWork,
};
use saga_engine_core::step::StepsBuilder;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Target of a grant. Only `has_cluster_access` changes, and it is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub capability_id: CapabilityId,
    pub cluster_id: ClusterId,
    pub has_cluster_access: bool,
}

#[async_trait]
impl SagaState for AccessGrant {
    async fn save(&self, _uow: &mut dyn UnitOfWork) -> Result<(), PersistenceError> {
        Ok(())
    }
}

type Context = SagaContext<AccessGrant>;

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

async fn ensure_service_account(ctx: &mut Context) -> DomainResult<()> {
    ctx.services
        .account
        .link_or_create_service_account(&mut *ctx.uow, &ctx.state.capability_id, &ctx.state.cluster_id)
        .await
}

/// A key counted at the platform is only kept while its secret is still
/// held locally or in the vault; otherwise it is replaced.
async fn ensure_cluster_api_key(ctx: &mut Context) -> DomainResult<()> {
    let access = ctx
        .services
        .account
        .get_cluster_access(&mut *ctx.uow, &ctx.state.capability_id, &ctx.state.cluster_id)
        .await?;

    let existing = ctx
        .services
        .account
        .count_cluster_api_keys(&access.service_account_id, &ctx.state.cluster_id)
        .await?;
    if existing > 0 {
        let in_vault = ctx
            .services
            .vault
            .has_api_key(&ctx.state.capability_id, &ctx.state.cluster_id, ApiKeyDestination::Cluster)
            .await?;
        if access.has_api_key() || in_vault {
            debug!(count = existing, "Cluster API key already exists");
            return Ok(());
        }

        warn!(
            count = existing,
            "Cluster API key exists at the platform but its secret is lost, replacing it"
        );
        ctx.services
            .account
            .discard_orphaned_cluster_api_keys(&access.service_account_id, &ctx.state.cluster_id)
            .await?;
    }

    ctx.services
        .account
        .create_cluster_api_key(&mut *ctx.uow, &ctx.state.capability_id, &ctx.state.cluster_id)
        .await?;
    Ok(())
}

async fn ensure_cluster_api_key_is_stored_in_vault(ctx: &mut Context) -> DomainResult<()> {
    let stored = ctx
        .services
        .vault
        .has_api_key(&ctx.state.capability_id, &ctx.state.cluster_id, ApiKeyDestination::Cluster)
        .await?;
    if stored {
        return Ok(());
    }

    let access = ctx
        .services
        .account
        .get_cluster_access(&mut *ctx.uow, &ctx.state.capability_id, &ctx.state.cluster_id)
        .await?;
    if !access.has_api_key() {
        return Err(DomainError::ApiKeyMissing {
            capability_id: ctx.state.capability_id.clone(),
            cluster_id: ctx.state.cluster_id.clone(),
        });
    }

    ctx.services
        .vault
        .store_api_key(
            &ctx.state.capability_id,
            &ctx.state.cluster_id,
            ApiKeyDestination::Cluster,
            &access.api_key,
        )
        .await
}

/// Clusters without a schema registry get cluster access only.
fn skip_without_registry(result: DomainResult<()>, step: &str) -> DomainResult<()> {
    match result {
        Err(e) if e.is_schema_registry_missing() => {
            warn!(step, error = %e, "Cluster has no schema registry, skipping");
            Ok(())
        }
        other => other,
    }
}

async fn ensure_schema_registry_api_key(ctx: &mut Context) -> DomainResult<()> {
    let result = store_schema_registry_api_key(ctx).await;
    skip_without_registry(result, "ensure_schema_registry_api_key")
}

/// The registry key is never stored locally, so it is created and mirrored
/// within one attempt. Platform keys without a vault copy are replaced.
async fn store_schema_registry_api_key(ctx: &mut Context) -> DomainResult<()> {
    let capability_id = &ctx.state.capability_id;
    let cluster_id = &ctx.state.cluster_id;

    let stored = ctx
        .services
        .vault
        .has_api_key(capability_id, cluster_id, ApiKeyDestination::SchemaRegistry)
        .await?;
    if stored {
        return Ok(());
    }

    let access = ctx
        .services
        .account
        .get_cluster_access(&mut *ctx.uow, capability_id, cluster_id)
        .await?;

    let existing = ctx
        .services
        .account
        .count_schema_registry_api_keys(&access.service_account_id, cluster_id)
        .await?;
    if existing > 0 {
        warn!(
            count = existing,
            "Schema registry API key exists at the platform but is not in the vault, replacing it"
        );
        ctx.services
            .account
            .discard_orphaned_schema_registry_api_keys(&access.service_account_id, cluster_id)
            .await?;
    }

    let api_key = ctx
        .services
        .account
        .create_schema_registry_api_key(&access.service_account_id, cluster_id)
        .await?;

    if let Err(e) = ctx
        .services
        .vault
        .store_api_key(capability_id, cluster_id, ApiKeyDestination::SchemaRegistry, &api_key)
        .await
    {
        ctx.services
            .account
            .discard_schema_registry_api_key(cluster_id, &api_key)
            .await;
        return Err(e);
    }
    Ok(())
}

async fn ensure_schema_registry_role_binding(ctx: &mut Context) -> DomainResult<()> {
    let result = bind_schema_registry_role(ctx).await;
    skip_without_registry(result, "ensure_schema_registry_role_binding")
}

async fn bind_schema_registry_role(ctx: &mut Context) -> DomainResult<()> {
    let access = ctx
        .services
        .account
        .get_cluster_access(&mut *ctx.uow, &ctx.state.capability_id, &ctx.state.cluster_id)
        .await?;

    ctx.services
        .account
        .create_schema_registry_role_binding(&access.service_account_id, &ctx.state.cluster_id)
        .await
}

pub struct ServiceAccountProcess {
    database: Arc<dyn Database>,
    services: SagaServices,
    steps: SagaSteps<AccessGrant>,
}

impl ServiceAccountProcess {
    pub fn new(database: Arc<dyn Database>, services: SagaServices) -> Self {
        let steps = StepsBuilder::<Context, DomainError>::new()
            .step("ensure_service_account", |ctx| {
                Box::pin(ensure_service_account(ctx))
            })
            .step("ensure_service_account_acl", |ctx| {
                Box::pin(ensure_service_account_acl(ctx))
            })
            .until(|ctx| ctx.state.has_cluster_access)
            .step("ensure_cluster_api_key", |ctx| {
                Box::pin(ensure_cluster_api_key(ctx))
            })
            .step("ensure_cluster_api_key_is_stored_in_vault", |ctx| {
                Box::pin(ensure_cluster_api_key_is_stored_in_vault(ctx))
            })
            .step("ensure_schema_registry_api_key", |ctx| {
                Box::pin(ensure_schema_registry_api_key(ctx))
            })
            .step("ensure_schema_registry_role_binding", |ctx| {
                Box::pin(ensure_schema_registry_role_binding(ctx))
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
        fields(capability_id = %request.capability_id, cluster_id = %request.cluster_id)
    )]
    pub async fn process(&self, request: &ServiceAccountAccessRequested) -> DomainResult<()> {
        let state = AccessGrant {
            capability_id: request.capability_id.clone(),
            cluster_id: request.cluster_id.clone(),
            has_cluster_access: false,
        };

        let mut performer = SagaPerformer::new(self.database.clone(), self.services.clone(), state);
        self.steps.run(&mut performer).await?;

        info!("Cluster access granted");
        Ok(())
    }
}
