//! Secret store port for mirroring API keys.

use crate::error::SecretStoreError;
use crate::models::ApiKey;
use crate::{CapabilityId, ClusterId};
use async_trait::async_trait;
use std::fmt;

/// Which credential of a capability's cluster access is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyDestination {
    Cluster,
    SchemaRegistry,
}

impl fmt::Display for ApiKeyDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => write!(f, "cluster"),
            Self::SchemaRegistry => write!(f, "schema-registry"),
        }
    }
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn store_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
        api_key: &ApiKey,
    ) -> Result<(), SecretStoreError>;

    async fn query_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> Result<bool, SecretStoreError>;

    /// Deleting a key that is not stored succeeds.
    async fn delete_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> Result<(), SecretStoreError>;
}
