//! Service accounts, cluster accesses, ACL entries and API keys.

use confluent_gateway_domain::{
    AclEntry, ApiKey, CapabilityId, ClusterAccess, ClusterId, ConfluentApi, DomainError,
    DomainResult, ServiceAccount, ServiceAccountId, UnitOfWork, UserAccountId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SERVICE_ACCOUNT_DESCRIPTION: &str = "Created by Confluent Gateway";

#[derive(Clone)]
pub struct AccountService {
    confluent: Arc<dyn ConfluentApi>,
}

impl AccountService {
    pub fn new(confluent: Arc<dyn ConfluentApi>) -> Self {
        Self { confluent }
    }

    /// Gives the capability a service account with access to `cluster_id`.
    ///
    /// An account the capability already owns is reused; otherwise a new one
    /// is created at the platform.
    pub async fn create_service_account(
        &self,
        uow: &mut dyn UnitOfWork,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        if let Some(account) = uow.get_service_account(capability_id).await? {
            return self.attach_cluster(uow, &account, cluster_id).await;
        }

        let service_account_id = self
            .confluent
            .create_service_account(capability_id.as_str(), SERVICE_ACCOUNT_DESCRIPTION)
            .await?;

        self.store_new_account(uow, service_account_id, capability_id, cluster_id)
            .await
    }

    /// Like [`Self::create_service_account`], but links an account that
    /// already exists at the platform under the capability's name.
    pub async fn link_or_create_service_account(
        &self,
        uow: &mut dyn UnitOfWork,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        if let Some(account) = uow.get_service_account(capability_id).await? {
            return self.attach_cluster(uow, &account, cluster_id).await;
        }

        let display_name = capability_id.as_str();
        let service_account_id = match self
            .confluent
            .create_service_account(display_name, SERVICE_ACCOUNT_DESCRIPTION)
            .await
        {
            Ok(id) => id,
            Err(e) if e.is_conflict() => {
                info!(capability_id = %capability_id, "Service account exists at the platform, linking it");
                self.confluent
                    .get_service_account_by_display_name(display_name)
                    .await?
                    .ok_or_else(|| DomainError::ServiceAccountNotResolved {
                        display_name: display_name.to_string(),
                    })?
            }
            Err(e) => return Err(e.into()),
        };

        self.store_new_account(uow, service_account_id, capability_id, cluster_id)
            .await
    }

    async fn store_new_account(
        &self,
        uow: &mut dyn UnitOfWork,
        service_account_id: ServiceAccountId,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        let user_account_id = self.resolve_user_account(&service_account_id).await?;

        let account = ServiceAccount::new(
            service_account_id,
            capability_id.clone(),
            user_account_id,
            cluster_id.clone(),
        );
        uow.create_service_account(&account).await?;

        info!(
            capability_id = %capability_id,
            service_account_id = %account.id,
            user_account_id = %account.user_account_id,
            "Service account created"
        );
        Ok(())
    }

    async fn attach_cluster(
        &self,
        uow: &mut dyn UnitOfWork,
        account: &ServiceAccount,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        if account.cluster_access(cluster_id).is_some() {
            debug!(service_account_id = %account.id, cluster_id = %cluster_id, "Service account already has cluster access");
            return Ok(());
        }

        uow.create_cluster_access(&account.new_cluster_access(cluster_id.clone()))
            .await?;
        Ok(())
    }

    /// ACL principal of a freshly created service account.
    async fn resolve_user_account(
        &self,
        service_account_id: &ServiceAccountId,
    ) -> DomainResult<UserAccountId> {
        let users = self.confluent.list_internal_users().await?;

        let user = users
            .into_iter()
            .find(|user| &user.resource_id == service_account_id)
            .ok_or_else(|| DomainError::UserAccountNotFound {
                service_account_id: service_account_id.clone(),
            })?;

        if user.deactivated {
            return Err(DomainError::UserAccountDeactivated {
                service_account_id: service_account_id.clone(),
            });
        }

        Ok(UserAccountId::from_internal_user(user.id))
    }

    pub async fn has_service_account(
        &self,
        uow: &mut dyn UnitOfWork,
        capability_id: &CapabilityId,
    ) -> DomainResult<bool> {
        Ok(uow.get_service_account(capability_id).await?.is_some())
    }

    pub async fn get_cluster_access(
        &self,
        uow: &mut dyn UnitOfWork,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> DomainResult<ClusterAccess> {
        uow.get_cluster_access(capability_id, cluster_id)
            .await?
            .ok_or_else(|| DomainError::ClusterAccessNotFound {
                capability_id: capability_id.clone(),
                cluster_id: cluster_id.clone(),
            })
    }

    /// Existing access for the cluster, or a new one seeded with the
    /// pending ACL template.
    pub async fn get_or_create_cluster_access(
        &self,
        uow: &mut dyn UnitOfWork,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> DomainResult<ClusterAccess> {
        if let Some(access) = uow.get_cluster_access(capability_id, cluster_id).await? {
            return Ok(access);
        }

        let account = uow.get_service_account(capability_id).await?.ok_or_else(|| {
            DomainError::ServiceAccountNotFound {
                capability_id: capability_id.clone(),
            }
        })?;

        let access = account.new_cluster_access(cluster_id.clone());
        uow.create_cluster_access(&access).await?;
        Ok(access)
    }

    /// Applies one ACL entry at the platform and records it as done.
    pub async fn create_acl_entry(
        &self,
        uow: &mut dyn UnitOfWork,
        access: &ClusterAccess,
        entry: &AclEntry,
    ) -> DomainResult<()> {
        self.confluent
            .create_acl_entry(&access.cluster_id, &access.user_account_id, &entry.definition)
            .await?;

        let mut applied = entry.clone();
        applied.mark_as_done();
        uow.update_acl_entry(access.id, &applied).await?;

        debug!(
            cluster_id = %access.cluster_id,
            user_account_id = %access.user_account_id,
            acl = %entry.definition,
            "ACL entry applied"
        );
        Ok(())
    }

    /// Creates a cluster API key and stores it on the cluster access.
    pub async fn create_cluster_api_key(
        &self,
        uow: &mut dyn UnitOfWork,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> DomainResult<ClusterAccess> {
        let mut access = self
            .get_cluster_access(uow, capability_id, cluster_id)
            .await?;

        access.api_key = self
            .confluent
            .create_cluster_api_key(cluster_id, &access.service_account_id)
            .await?;
        uow.update_cluster_access(&access).await?;

        info!(
            capability_id = %capability_id,
            cluster_id = %cluster_id,
            api_key = %access.api_key.username,
            "Cluster API key created"
        );
        Ok(access)
    }

    pub async fn count_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> DomainResult<usize> {
        Ok(self
            .confluent
            .count_cluster_api_keys(service_account_id, cluster_id)
            .await?)
    }

    pub async fn count_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> DomainResult<usize> {
        Ok(self
            .confluent
            .count_schema_registry_api_keys(service_account_id, cluster_id)
            .await?)
    }

    pub async fn create_schema_registry_api_key(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> DomainResult<ApiKey> {
        Ok(self
            .confluent
            .create_schema_registry_api_key(cluster_id, service_account_id)
            .await?)
    }

    /// Best-effort removal of a schema registry key that could not be stored.
    pub async fn discard_schema_registry_api_key(&self, cluster_id: &ClusterId, api_key: &ApiKey) {
        if let Err(e) = self
            .confluent
            .delete_schema_registry_api_key(cluster_id, &api_key.username)
            .await
        {
            warn!(
                cluster_id = %cluster_id,
                api_key = %api_key.username,
                error = %e,
                "Failed to discard schema registry API key"
            );
        }
    }

    /// Deletes cluster keys the platform holds for the account whose secret
    /// was lost. Keys already gone count as deleted.
    pub async fn discard_orphaned_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        let keys = self
            .confluent
            .list_cluster_api_keys(service_account_id, cluster_id)
            .await?;

        for key in keys {
            match self.confluent.delete_cluster_api_key(cluster_id, &key).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
            warn!(cluster_id = %cluster_id, api_key = %key, "Discarded orphaned cluster API key");
        }
        Ok(())
    }

    /// Registry counterpart of [`Self::discard_orphaned_cluster_api_keys`].
    pub async fn discard_orphaned_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        let keys = self
            .confluent
            .list_schema_registry_api_keys(service_account_id, cluster_id)
            .await?;

        for key in keys {
            match self
                .confluent
                .delete_schema_registry_api_key(cluster_id, &key)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
            warn!(cluster_id = %cluster_id, api_key = %key, "Discarded orphaned schema registry API key");
        }
        Ok(())
    }

    /// Grants registry access; an existing binding counts as granted.
    pub async fn create_schema_registry_role_binding(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> DomainResult<()> {
        match self
            .confluent
            .create_service_account_role_binding(service_account_id, cluster_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => {
                debug!(service_account_id = %service_account_id, "Role binding already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
