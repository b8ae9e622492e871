use confluent_gateway_domain::{
    ApiKey, ApiKeyDestination, CapabilityId, ClusterId, DomainResult, SecretStore,
};
use std::sync::Arc;
use tracing::info;

/// Mirrors API keys into the secret store.
#[derive(Clone)]
pub struct VaultService {
    secrets: Arc<dyn SecretStore>,
}

impl VaultService {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    pub async fn store_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
        api_key: &ApiKey,
    ) -> DomainResult<()> {
        self.secrets
            .store_api_key(capability_id, cluster_id, destination, api_key)
            .await?;

        info!(
            capability_id = %capability_id,
            cluster_id = %cluster_id,
            destination = %destination,
            "API key stored in vault"
        );
        Ok(())
    }

    pub async fn has_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> DomainResult<bool> {
        Ok(self
            .secrets
            .query_api_key(capability_id, cluster_id, destination)
            .await?)
    }
}
