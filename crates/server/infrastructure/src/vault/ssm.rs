//! AWS SSM Parameter Store backed secret store.
//!
//! Keys are stored as `SecureString` parameters holding `{"key", "secret"}`
//! JSON, one parameter per capability, cluster and destination.

use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::types::{ParameterType, ResourceTypeForTagging, Tag};
use confluent_gateway_domain::{
    ApiKey, ApiKeyDestination, CapabilityId, ClusterId, SecretStore, SecretStoreError,
};
use confluent_gateway_shared::config::VaultConfig;
use serde::Serialize;
use tracing::{debug, info};

const CREATED_BY: &str = "confluent-gateway";

#[derive(Debug, Serialize)]
struct StoredApiKey<'a> {
    key: &'a str,
    secret: &'a str,
}

/// Parameter name for a capability's credential on a cluster.
pub fn parameter_name(
    capability_id: &CapabilityId,
    cluster_id: &ClusterId,
    destination: ApiKeyDestination,
) -> String {
    let leaf = match destination {
        ApiKeyDestination::Cluster => "credentials",
        ApiKeyDestination::SchemaRegistry => "schemaregistry-credentials",
    };
    format!("/capabilities/{capability_id}/kafka/{cluster_id}/{leaf}")
}

fn backend_error(err: impl std::fmt::Display) -> SecretStoreError {
    SecretStoreError::Backend(err.to_string())
}

pub struct SsmSecretStore {
    client: Client,
}

impl SsmSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads AWS settings from the environment, overriding the region when
    /// one is configured.
    pub async fn from_config(config: &VaultConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &config.region {
            debug!(region = %region, "Using configured AWS region");
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        Self::new(Client::new(&sdk_config))
    }

    fn tag(key: &str, value: &str) -> Result<Tag, SecretStoreError> {
        Tag::builder()
            .key(key)
            .value(value)
            .build()
            .map_err(backend_error)
    }
}

#[async_trait]
impl SecretStore for SsmSecretStore {
    async fn store_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
        api_key: &ApiKey,
    ) -> Result<(), SecretStoreError> {
        let name = parameter_name(capability_id, cluster_id, destination);
        let value = serde_json::to_string(&StoredApiKey {
            key: &api_key.username,
            secret: &api_key.password,
        })?;

        self.client
            .put_parameter()
            .name(&name)
            .value(value)
            .r#type(ParameterType::SecureString)
            .overwrite(true)
            .send()
            .await
            .map_err(backend_error)?;

        // Tags cannot be combined with overwrite in PutParameter.
        self.client
            .add_tags_to_resource()
            .resource_type(ResourceTypeForTagging::Parameter)
            .resource_id(&name)
            .tags(Self::tag("capabilityId", capability_id.as_str())?)
            .tags(Self::tag("clusterId", cluster_id.as_str())?)
            .tags(Self::tag("createdBy", CREATED_BY)?)
            .send()
            .await
            .map_err(backend_error)?;

        info!(parameter = %name, %destination, "Stored API key");
        Ok(())
    }

    async fn query_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> Result<bool, SecretStoreError> {
        let name = parameter_name(capability_id, cluster_id, destination);

        match self.client.get_parameter().name(&name).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found()) =>
            {
                Ok(false)
            }
            Err(err) => Err(backend_error(err)),
        }
    }

    async fn delete_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> Result<(), SecretStoreError> {
        let name = parameter_name(capability_id, cluster_id, destination);

        match self.client.delete_parameter().name(&name).send().await {
            Ok(_) => {
                info!(parameter = %name, "Deleted API key");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_parameter_not_found()) =>
            {
                Ok(())
            }
            Err(err) => Err(backend_error(err)),
        }
    }
}
