//! HTTP client for the Confluent Cloud control plane.
//!
//! Organization-level calls (IAM, API keys, role bindings) go to the cloud
//! API with the gateway's own key. Cluster-level calls go to the cluster's
//! REST endpoint or schema registry with the credentials from the catalog.

use super::models::{
    ApiKeyResponse, ApiKeySpec, ApiKeySummary, CreateAclRequest, CreateApiKeyRequest,
    CreateRoleBindingRequest, CreateServiceAccountRequest, CreateTopicRequest,
    InternalUsersResponse, ListResponse, ObjectReference, RegisterSchemaRequest,
    ServiceAccountResponse, TopicConfig,
};
use async_trait::async_trait;
use confluent_gateway_domain::{
    AclDefinition, ApiKey, Cluster, ClusterCatalog, ClusterId, ConfluentApi, ConfluentError,
    InternalUser, SchemaRegistry, ServiceAccountId, TopicSpec, UserAccountId,
};
use confluent_gateway_shared::config::ConfluentConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA_REGISTRY_ROLE: &str = "DeveloperRead";
const API_KEY_DESCRIPTION: &str = "Created by Confluent Gateway";

/// Role binding pattern covering every subject of a registry.
fn subjects_crn(cluster: &Cluster, registry: &SchemaRegistry) -> String {
    format!(
        "crn://confluent.cloud/organization={}/environment={}/schema-registry={}/subject=*",
        cluster.organization_id, cluster.environment_id, registry.id
    )
}

fn trim_endpoint(endpoint: &str) -> &str {
    endpoint.trim_end_matches('/')
}

pub struct ConfluentClient {
    http: Client,
    cloud_api_url: String,
    cloud_api_key: ApiKey,
    catalog: Arc<dyn ClusterCatalog>,
}

impl ConfluentClient {
    pub fn new(
        config: &ConfluentConfig,
        catalog: Arc<dyn ClusterCatalog>,
    ) -> Result<Self, ConfluentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| ConfluentError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            cloud_api_url: trim_endpoint(&config.cloud_api_url).to_string(),
            cloud_api_key: ApiKey::new(&config.cloud_api_username, &config.cloud_api_password),
            catalog,
        })
    }

    async fn cluster(&self, cluster_id: &ClusterId) -> Result<Cluster, ConfluentError> {
        self.catalog
            .get_cluster(cluster_id)
            .await
            .map_err(|e| ConfluentError::Transport(format!("cluster catalog: {e}")))?
            .ok_or_else(|| ConfluentError::UnknownCluster {
                cluster_id: cluster_id.clone(),
            })
    }

    async fn schema_registry(
        &self,
        cluster_id: &ClusterId,
    ) -> Result<(Cluster, SchemaRegistry), ConfluentError> {
        let mut cluster = self.cluster(cluster_id).await?;
        let registry = cluster.schema_registry.take().ok_or_else(|| {
            ConfluentError::SchemaRegistryNotConfigured {
                cluster_id: cluster_id.clone(),
            }
        })?;
        Ok((cluster, registry))
    }

    fn cloud(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(
            &self.cloud_api_key.username,
            Some(&self.cloud_api_key.password),
        )
    }

    fn cluster_admin(&self, cluster: &Cluster, path: &str) -> String {
        format!(
            "{}/kafka/v3/clusters/{}{}",
            trim_endpoint(&cluster.admin_api_endpoint),
            cluster.id,
            path
        )
    }

    /// Sends the request; any non-2xx answer becomes a `ClientRejection`.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, ConfluentError> {
        let response = request
            .send()
            .await
            .map_err(|e| ConfluentError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%url, status = status.as_u16(), "Confluent request rejected");
        Err(ConfluentError::ClientRejection {
            url: url.to_string(),
            status_code: status.as_u16(),
            body,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ConfluentError> {
        response
            .json()
            .await
            .map_err(|e| ConfluentError::InvalidResponse {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn create_api_key(
        &self,
        service_account_id: &ServiceAccountId,
        resource_id: &str,
    ) -> Result<ApiKey, ConfluentError> {
        let url = format!("{}/iam/v2/api-keys", self.cloud_api_url);
        let body = CreateApiKeyRequest {
            spec: ApiKeySpec {
                display_name: "",
                description: API_KEY_DESCRIPTION,
                owner: ObjectReference {
                    id: service_account_id.as_str(),
                },
                resource: ObjectReference { id: resource_id },
            },
        };

        let response = self.send(self.cloud(self.http.post(&url)).json(&body), &url).await?;
        let key: ApiKeyResponse = Self::parse(response, &url).await?;

        info!(
            service_account_id = %service_account_id,
            resource_id,
            api_key = %key.id,
            "Created API key"
        );
        Ok(ApiKey::new(key.id, key.spec.secret))
    }

    async fn delete_api_key(&self, api_key: &str) -> Result<(), ConfluentError> {
        let url = format!("{}/iam/v2/api-keys/{}", self.cloud_api_url, api_key);
        self.send(self.cloud(self.http.delete(&url)), &url).await?;
        info!(api_key, "Deleted API key");
        Ok(())
    }

    async fn list_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        resource_id: &str,
    ) -> Result<Vec<String>, ConfluentError> {
        let url = format!("{}/iam/v2/api-keys", self.cloud_api_url);
        let request = self.cloud(self.http.get(&url)).query(&[
            ("spec.owner", service_account_id.as_str()),
            ("spec.resource", resource_id),
        ]);

        let response = self.send(request, &url).await?;
        let keys: ListResponse<ApiKeySummary> = Self::parse(response, &url).await?;
        Ok(keys.data.into_iter().map(|key| key.id).collect())
    }
}

#[async_trait]
impl ConfluentApi for ConfluentClient {
    async fn create_service_account(
        &self,
        display_name: &str,
        description: &str,
    ) -> Result<ServiceAccountId, ConfluentError> {
        let url = format!("{}/iam/v2/service-accounts", self.cloud_api_url);
        let body = CreateServiceAccountRequest {
            display_name,
            description,
        };

        let response = match self.send(self.cloud(self.http.post(&url)).json(&body), &url).await {
            Ok(response) => response,
            Err(e) if e.status_code() == Some(409) => {
                return Err(ConfluentError::ServiceAccountAlreadyExists {
                    display_name: display_name.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let account: ServiceAccountResponse = Self::parse(response, &url).await?;
        info!(service_account_id = %account.id, display_name, "Created service account");
        Ok(ServiceAccountId::new(account.id))
    }

    async fn get_service_account_by_display_name(
        &self,
        display_name: &str,
    ) -> Result<Option<ServiceAccountId>, ConfluentError> {
        let mut next = Some(format!(
            "{}/iam/v2/service-accounts?page_size=100",
            self.cloud_api_url
        ));

        while let Some(url) = next {
            let response = self.send(self.cloud(self.http.get(&url)), &url).await?;
            let page: ListResponse<ServiceAccountResponse> = Self::parse(response, &url).await?;

            if let Some(account) = page
                .data
                .into_iter()
                .find(|account| account.display_name == display_name)
            {
                return Ok(Some(ServiceAccountId::new(account.id)));
            }
            next = page.metadata.next.filter(|n| !n.is_empty());
        }

        Ok(None)
    }

    async fn create_acl_entry(
        &self,
        cluster_id: &ClusterId,
        user_account_id: &UserAccountId,
        entry: &AclDefinition,
    ) -> Result<(), ConfluentError> {
        let cluster = self.cluster(cluster_id).await?;
        let url = self.cluster_admin(&cluster, "/acls");
        let body = CreateAclRequest {
            resource_type: entry.resource_type.as_str(),
            resource_name: &entry.resource_name,
            pattern_type: entry.pattern_type.as_str(),
            principal: user_account_id.as_str(),
            host: "*",
            operation: entry.operation_type.as_str(),
            permission: entry.permission_type.as_str(),
        };

        let request = self
            .http
            .post(&url)
            .basic_auth(
                &cluster.admin_api_key.username,
                Some(&cluster.admin_api_key.password),
            )
            .json(&body);
        self.send(request, &url).await?;

        debug!(cluster_id = %cluster_id, principal = %user_account_id, acl = %entry, "Created ACL entry");
        Ok(())
    }

    async fn create_cluster_api_key(
        &self,
        cluster_id: &ClusterId,
        service_account_id: &ServiceAccountId,
    ) -> Result<ApiKey, ConfluentError> {
        self.create_api_key(service_account_id, cluster_id.as_str())
            .await
    }

    async fn create_schema_registry_api_key(
        &self,
        cluster_id: &ClusterId,
        service_account_id: &ServiceAccountId,
    ) -> Result<ApiKey, ConfluentError> {
        let (_, registry) = self.schema_registry(cluster_id).await?;
        self.create_api_key(service_account_id, &registry.id).await
    }

    async fn delete_cluster_api_key(
        &self,
        _cluster_id: &ClusterId,
        api_key: &str,
    ) -> Result<(), ConfluentError> {
        self.delete_api_key(api_key).await
    }

    async fn delete_schema_registry_api_key(
        &self,
        _cluster_id: &ClusterId,
        api_key: &str,
    ) -> Result<(), ConfluentError> {
        self.delete_api_key(api_key).await
    }

    async fn create_service_account_role_binding(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<(), ConfluentError> {
        let (cluster, registry) = self.schema_registry(cluster_id).await?;
        let url = format!("{}/iam/v2/role-bindings", self.cloud_api_url);
        let principal = format!("User:{}", service_account_id);
        let crn_pattern = subjects_crn(&cluster, &registry);
        let body = CreateRoleBindingRequest {
            principal: &principal,
            role_name: SCHEMA_REGISTRY_ROLE,
            crn_pattern: &crn_pattern,
        };

        self.send(self.cloud(self.http.post(&url)).json(&body), &url)
            .await?;

        info!(service_account_id = %service_account_id, %crn_pattern, "Created role binding");
        Ok(())
    }

    async fn create_topic(
        &self,
        cluster_id: &ClusterId,
        topic: &TopicSpec,
    ) -> Result<(), ConfluentError> {
        let cluster = self.cluster(cluster_id).await?;
        let url = self.cluster_admin(&cluster, "/topics");
        let body = CreateTopicRequest {
            topic_name: &topic.name,
            partitions_count: topic.partitions,
            configs: vec![TopicConfig {
                name: "retention.ms",
                value: topic.retention_ms.to_string(),
            }],
        };

        let request = self
            .http
            .post(&url)
            .basic_auth(
                &cluster.admin_api_key.username,
                Some(&cluster.admin_api_key.password),
            )
            .json(&body);
        self.send(request, &url).await?;

        info!(cluster_id = %cluster_id, topic = %topic.name, partitions = topic.partitions, "Created topic");
        Ok(())
    }

    async fn delete_topic(
        &self,
        cluster_id: &ClusterId,
        topic_name: &str,
    ) -> Result<(), ConfluentError> {
        let cluster = self.cluster(cluster_id).await?;
        let url = self.cluster_admin(&cluster, &format!("/topics/{topic_name}"));

        let request = self.http.delete(&url).basic_auth(
            &cluster.admin_api_key.username,
            Some(&cluster.admin_api_key.password),
        );
        self.send(request, &url).await?;

        info!(cluster_id = %cluster_id, topic = topic_name, "Deleted topic");
        Ok(())
    }

    async fn register_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        schema: &str,
    ) -> Result<(), ConfluentError> {
        let (_, registry) = self.schema_registry(cluster_id).await?;
        let url = format!(
            "{}/subjects/{}/versions",
            trim_endpoint(&registry.api_endpoint),
            subject
        );
        let body = RegisterSchemaRequest {
            schema_type: "JSON",
            schema,
        };

        let request = self
            .http
            .post(&url)
            .basic_auth(&registry.api_key.username, Some(&registry.api_key.password))
            .json(&body);
        self.send(request, &url).await?;

        info!(cluster_id = %cluster_id, subject, "Registered schema");
        Ok(())
    }

    async fn delete_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        version: i32,
    ) -> Result<(), ConfluentError> {
        let (_, registry) = self.schema_registry(cluster_id).await?;
        let url = format!(
            "{}/subjects/{}/versions/{}",
            trim_endpoint(&registry.api_endpoint),
            subject,
            version
        );

        let request = self
            .http
            .delete(&url)
            .basic_auth(&registry.api_key.username, Some(&registry.api_key.password));
        self.send(request, &url).await?;

        info!(cluster_id = %cluster_id, subject, version, "Deleted schema version");
        Ok(())
    }

    async fn count_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<usize, ConfluentError> {
        Ok(self
            .list_api_keys(service_account_id, cluster_id.as_str())
            .await?
            .len())
    }

    async fn count_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<usize, ConfluentError> {
        let (_, registry) = self.schema_registry(cluster_id).await?;
        Ok(self.list_api_keys(service_account_id, &registry.id).await?.len())
    }

    async fn list_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<Vec<String>, ConfluentError> {
        self.list_api_keys(service_account_id, cluster_id.as_str())
            .await
    }

    async fn list_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<Vec<String>, ConfluentError> {
        let (_, registry) = self.schema_registry(cluster_id).await?;
        self.list_api_keys(service_account_id, &registry.id).await
    }

    async fn list_internal_users(&self) -> Result<Vec<InternalUser>, ConfluentError> {
        let url = format!("{}/service_accounts", self.cloud_api_url);
        let response = self.send(self.cloud(self.http.get(&url)), &url).await?;
        let users: InternalUsersResponse = Self::parse(response, &url).await?;

        Ok(users
            .users
            .into_iter()
            .map(|user| InternalUser {
                id: user.id,
                resource_id: ServiceAccountId::new(user.resource_id),
                deactivated: user.deactivated,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confluent_gateway_domain::PersistenceError;

    struct StaticCatalog(Vec<Cluster>);

    #[async_trait]
    impl ClusterCatalog for StaticCatalog {
        async fn get_cluster(&self, id: &ClusterId) -> Result<Option<Cluster>, PersistenceError> {
            Ok(self.0.iter().find(|c| &c.id == id).cloned())
        }

        async fn list_clusters(&self) -> Result<Vec<Cluster>, PersistenceError> {
            Ok(self.0.clone())
        }
    }

    fn cluster(with_registry: bool) -> Cluster {
        Cluster {
            id: ClusterId::new("lkc-1"),
            name: "prod".to_string(),
            admin_api_endpoint: "https://pkc-1.eu-west-1.aws.confluent.cloud:443/".to_string(),
            admin_api_key: ApiKey::new("admin", "secret"),
            bootstrap_endpoint: "pkc-1.eu-west-1.aws.confluent.cloud:9092".to_string(),
            organization_id: "org-1".to_string(),
            environment_id: "env-1".to_string(),
            schema_registry: with_registry.then(|| SchemaRegistry {
                id: "lsrc-1".to_string(),
                api_endpoint: "https://psrc-1.eu-central-1.aws.confluent.cloud".to_string(),
                api_key: ApiKey::new("sr", "sr-secret"),
            }),
        }
    }

    fn client(clusters: Vec<Cluster>) -> ConfluentClient {
        let config = ConfluentConfig {
            cloud_api_url: "https://api.confluent.cloud/".to_string(),
            cloud_api_username: "user".to_string(),
            cloud_api_password: "pass".to_string(),
            http_timeout_secs: 5,
        };
        ConfluentClient::new(&config, Arc::new(StaticCatalog(clusters))).unwrap()
    }

    #[test]
    fn test_cluster_admin_url_trims_trailing_slash() {
        let client = client(vec![]);

        assert_eq!(
            client.cluster_admin(&cluster(false), "/topics"),
            "https://pkc-1.eu-west-1.aws.confluent.cloud:443/kafka/v3/clusters/lkc-1/topics"
        );
        assert_eq!(client.cloud_api_url, "https://api.confluent.cloud");
    }

    #[test]
    fn test_subjects_crn_covers_all_subjects() {
        let cluster = cluster(true);
        let registry = cluster.schema_registry.clone().unwrap();

        assert_eq!(
            subjects_crn(&cluster, &registry),
            "crn://confluent.cloud/organization=org-1/environment=env-1/schema-registry=lsrc-1/subject=*"
        );
    }

    #[test]
    fn test_create_topic_body_carries_retention() {
        let body = CreateTopicRequest {
            topic_name: "cap-1.orders",
            partitions_count: 3,
            configs: vec![TopicConfig {
                name: "retention.ms",
                value: 604_800_000i64.to_string(),
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["partitions_count"], 3);
        assert_eq!(json["configs"][0]["value"], "604800000");
    }

    #[tokio::test]
    async fn test_unknown_cluster_fails_before_any_request() {
        let client = client(vec![]);

        let err = client
            .create_topic(
                &ClusterId::new("lkc-404"),
                &TopicSpec {
                    name: "t".to_string(),
                    partitions: 1,
                    retention_ms: -1,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ConfluentError::UnknownCluster { .. }));
    }

    #[tokio::test]
    async fn test_registry_calls_require_configured_registry() {
        let client = client(vec![cluster(false)]);

        let err = client
            .register_schema(&ClusterId::new("lkc-1"), "t-event", "{}")
            .await
            .unwrap_err();

        assert!(matches!(err, ConfluentError::SchemaRegistryNotConfigured { .. }));
        assert!(!err.is_client_rejection());
    }

    #[tokio::test]
    async fn test_registry_key_listing_requires_configured_registry() {
        let client = client(vec![cluster(false)]);

        let err = client
            .list_schema_registry_api_keys(&ServiceAccountId::new("sa-1"), &ClusterId::new("lkc-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConfluentError::SchemaRegistryNotConfigured { .. }));
    }

    #[test]
    fn test_api_key_listing_parses_ids_only() {
        let body = r#"{"data":[{"id":"KEY1","spec":{"owner":{"id":"sa-1"}}},{"id":"KEY2"}],"metadata":{}}"#;

        let keys: ListResponse<ApiKeySummary> = serde_json::from_str(body).unwrap();

        let ids: Vec<_> = keys.data.into_iter().map(|key| key.id).collect();
        assert_eq!(ids, vec!["KEY1", "KEY2"]);
    }
}
