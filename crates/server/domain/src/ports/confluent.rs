//! Platform control-plane port.
//!
//! Cluster-scoped calls take a [`ClusterId`]; the adapter resolves the
//! cluster's endpoints and credentials itself.

use crate::error::ConfluentError;
use crate::models::{AclDefinition, ApiKey, TopicSpec};
use crate::{ClusterId, ServiceAccountId, UserAccountId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Legacy platform user backing a service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalUser {
    /// Numeric id used in ACL principals
    pub id: i64,
    /// Service account resource id the user belongs to
    pub resource_id: ServiceAccountId,
    pub deactivated: bool,
}

#[async_trait]
pub trait ConfluentApi: Send + Sync {
    async fn create_service_account(
        &self,
        display_name: &str,
        description: &str,
    ) -> Result<ServiceAccountId, ConfluentError>;

    async fn get_service_account_by_display_name(
        &self,
        display_name: &str,
    ) -> Result<Option<ServiceAccountId>, ConfluentError>;

    async fn create_acl_entry(
        &self,
        cluster_id: &ClusterId,
        user_account_id: &UserAccountId,
        entry: &AclDefinition,
    ) -> Result<(), ConfluentError>;

    async fn create_cluster_api_key(
        &self,
        cluster_id: &ClusterId,
        service_account_id: &ServiceAccountId,
    ) -> Result<ApiKey, ConfluentError>;

    async fn create_schema_registry_api_key(
        &self,
        cluster_id: &ClusterId,
        service_account_id: &ServiceAccountId,
    ) -> Result<ApiKey, ConfluentError>;

    async fn delete_cluster_api_key(
        &self,
        cluster_id: &ClusterId,
        api_key: &str,
    ) -> Result<(), ConfluentError>;

    async fn delete_schema_registry_api_key(
        &self,
        cluster_id: &ClusterId,
        api_key: &str,
    ) -> Result<(), ConfluentError>;

    /// Grants the account access to the subjects of the cluster's registry.
    async fn create_service_account_role_binding(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<(), ConfluentError>;

    async fn create_topic(
        &self,
        cluster_id: &ClusterId,
        topic: &TopicSpec,
    ) -> Result<(), ConfluentError>;

    async fn delete_topic(&self, cluster_id: &ClusterId, topic_name: &str)
    -> Result<(), ConfluentError>;

    async fn register_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        schema: &str,
    ) -> Result<(), ConfluentError>;

    async fn delete_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        version: i32,
    ) -> Result<(), ConfluentError>;

    async fn count_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<usize, ConfluentError>;

    async fn count_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<usize, ConfluentError>;

    /// Ids of the account's keys scoped to the cluster.
    async fn list_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<Vec<String>, ConfluentError>;

    /// Ids of the account's keys scoped to the cluster's schema registry.
    async fn list_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<Vec<String>, ConfluentError>;

    async fn list_internal_users(&self) -> Result<Vec<InternalUser>, ConfluentError>;
}
