//! Row types and their conversion into domain models.

use chrono::{DateTime, Utc};
use confluent_gateway_domain::{
    AclDefinition, AclEntry, ApiKey, ClusterAccess, CreateProcess, DeleteProcess,
    PersistenceError, SchemaProcess, ServiceAccount, Topic,
};
use confluent_gateway_domain::{Cluster, SchemaRegistry};
use saga_engine_core::outbox::OutboxEntry;
use std::str::FromStr;
use uuid::Uuid;

fn corrupt(table: &'static str, message: impl Into<String>) -> PersistenceError {
    PersistenceError::Corrupt {
        table,
        message: message.into(),
    }
}

fn parse<T: FromStr<Err = String>>(table: &'static str, value: &str) -> Result<T, PersistenceError> {
    value.parse().map_err(|e: String| corrupt(table, e))
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ClusterRow {
    id: String,
    name: String,
    admin_api_endpoint: String,
    admin_api_key_name: String,
    admin_api_key_secret: String,
    bootstrap_endpoint: String,
    organization_id: String,
    environment_id: String,
    schema_registry_id: Option<String>,
    schema_registry_api_endpoint: Option<String>,
    schema_registry_api_key_name: Option<String>,
    schema_registry_api_key_secret: Option<String>,
}

impl TryFrom<ClusterRow> for Cluster {
    type Error = PersistenceError;

    fn try_from(row: ClusterRow) -> Result<Self, Self::Error> {
        let schema_registry = match (
            row.schema_registry_id,
            row.schema_registry_api_endpoint,
            row.schema_registry_api_key_name,
            row.schema_registry_api_key_secret,
        ) {
            (Some(id), Some(api_endpoint), Some(name), Some(secret)) => Some(SchemaRegistry {
                id,
                api_endpoint,
                api_key: ApiKey::new(name, secret),
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(corrupt(
                    "cluster",
                    format!("incomplete schema registry settings for cluster {}", row.id),
                ));
            }
        };

        Ok(Cluster {
            id: row.id.into(),
            name: row.name,
            admin_api_endpoint: row.admin_api_endpoint,
            admin_api_key: ApiKey::new(row.admin_api_key_name, row.admin_api_key_secret),
            bootstrap_endpoint: row.bootstrap_endpoint,
            organization_id: row.organization_id,
            environment_id: row.environment_id,
            schema_registry,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ServiceAccountRow {
    pub id: String,
    pub capability_id: String,
    pub user_account_id: String,
    pub created_at: DateTime<Utc>,
}

impl ServiceAccountRow {
    pub fn into_account(self, cluster_accesses: Vec<ClusterAccess>) -> ServiceAccount {
        ServiceAccount {
            id: self.id.into(),
            capability_id: self.capability_id.into(),
            user_account_id: self.user_account_id.into(),
            cluster_accesses,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ClusterAccessRow {
    pub id: Uuid,
    pub service_account_id: String,
    pub user_account_id: String,
    pub cluster_id: String,
    pub capability_id: String,
    pub api_key_name: String,
    pub api_key_secret: String,
    pub created_at: DateTime<Utc>,
}

impl ClusterAccessRow {
    pub fn into_access(self, acl: Vec<AclEntry>) -> ClusterAccess {
        ClusterAccess {
            id: self.id,
            service_account_id: self.service_account_id.into(),
            user_account_id: self.user_account_id.into(),
            cluster_id: self.cluster_id.into(),
            capability_id: self.capability_id.into(),
            api_key: ApiKey::new(self.api_key_name, self.api_key_secret),
            acl,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AclRow {
    id: Uuid,
    resource_type: String,
    resource_name: String,
    pattern_type: String,
    operation_type: String,
    permission_type: String,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<AclRow> for AclEntry {
    type Error = PersistenceError;

    fn try_from(row: AclRow) -> Result<Self, Self::Error> {
        Ok(AclEntry {
            id: row.id,
            definition: AclDefinition::new(
                parse("acl", &row.resource_type)?,
                row.resource_name,
                parse("acl", &row.pattern_type)?,
                parse("acl", &row.operation_type)?,
                parse("acl", &row.permission_type)?,
            ),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TopicRow {
    id: String,
    capability_id: String,
    cluster_id: String,
    name: String,
    partitions: i32,
    retention_ms: i64,
    created_at: DateTime<Utc>,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Topic {
            id: row.id.into(),
            capability_id: row.capability_id.into(),
            cluster_id: row.cluster_id.into(),
            name: row.name,
            partitions: row.partitions,
            retention_ms: row.retention_ms,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CreateProcessRow {
    id: Uuid,
    capability_id: String,
    cluster_id: String,
    topic_id: String,
    topic_name: String,
    partitions: i32,
    retention_ms: i64,
    has_service_account: bool,
    has_cluster_access: bool,
    has_api_key: bool,
    has_api_key_in_vault: bool,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<CreateProcessRow> for CreateProcess {
    fn from(row: CreateProcessRow) -> Self {
        CreateProcess {
            id: row.id,
            capability_id: row.capability_id.into(),
            cluster_id: row.cluster_id.into(),
            topic_id: row.topic_id.into(),
            topic_name: row.topic_name,
            partitions: row.partitions,
            retention_ms: row.retention_ms,
            has_service_account: row.has_service_account,
            has_cluster_access: row.has_cluster_access,
            has_api_key: row.has_api_key,
            has_api_key_in_vault: row.has_api_key_in_vault,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct DeleteProcessRow {
    id: Uuid,
    topic_id: String,
    capability_id: String,
    cluster_id: String,
    topic_name: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<DeleteProcessRow> for DeleteProcess {
    fn from(row: DeleteProcessRow) -> Self {
        DeleteProcess {
            id: row.id,
            topic_id: row.topic_id.into(),
            capability_id: row.capability_id.into(),
            cluster_id: row.cluster_id.into(),
            topic_name: row.topic_name,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct SchemaProcessRow {
    id: Uuid,
    message_contract_id: String,
    topic_id: String,
    message_type: String,
    description: String,
    schema: String,
    schema_version: i32,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<SchemaProcessRow> for SchemaProcess {
    fn from(row: SchemaProcessRow) -> Self {
        SchemaProcess {
            id: row.id,
            message_contract_id: row.message_contract_id.into(),
            topic_id: row.topic_id.into(),
            message_type: row.message_type,
            description: row.description,
            schema: row.schema,
            schema_version: row.schema_version,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct OutboxRow {
    id: Uuid,
    topic: String,
    partition_key: String,
    payload: String,
    occurred_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<OutboxRow> for OutboxEntry {
    fn from(row: OutboxRow) -> Self {
        OutboxEntry {
            id: row.id,
            topic: row.topic,
            partition_key: row.partition_key,
            payload: row.payload,
            occurred_at: row.occurred_at,
            processed_at: row.processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confluent_gateway_domain::{OperationType, ResourceType};

    fn acl_row(operation_type: &str) -> AclRow {
        AclRow {
            id: Uuid::new_v4(),
            resource_type: "TOPIC".to_string(),
            resource_name: "cap-1.".to_string(),
            pattern_type: "PREFIXED".to_string(),
            operation_type: operation_type.to_string(),
            permission_type: "ALLOW".to_string(),
            created_at: None,
        }
    }

    fn cluster_row() -> ClusterRow {
        ClusterRow {
            id: "lkc-1".to_string(),
            name: "prod".to_string(),
            admin_api_endpoint: "https://pkc-1.confluent.cloud:443".to_string(),
            admin_api_key_name: "admin".to_string(),
            admin_api_key_secret: "secret".to_string(),
            bootstrap_endpoint: "pkc-1.confluent.cloud:9092".to_string(),
            organization_id: "org".to_string(),
            environment_id: "env-1".to_string(),
            schema_registry_id: None,
            schema_registry_api_endpoint: None,
            schema_registry_api_key_name: None,
            schema_registry_api_key_secret: None,
        }
    }

    #[test]
    fn test_acl_row_parses_wire_names() {
        let entry = AclEntry::try_from(acl_row("DESCRIBE_CONFIGS")).unwrap();

        assert_eq!(entry.definition.resource_type, ResourceType::Topic);
        assert_eq!(entry.definition.operation_type, OperationType::DescribeConfigs);
        assert!(entry.is_pending());
    }

    #[test]
    fn test_acl_row_with_unknown_operation_is_corrupt() {
        let err = AclEntry::try_from(acl_row("FLY")).unwrap_err();

        assert!(matches!(err, PersistenceError::Corrupt { table: "acl", .. }));
    }

    #[test]
    fn test_cluster_without_registry() {
        let cluster = Cluster::try_from(cluster_row()).unwrap();

        assert!(cluster.schema_registry.is_none());
        assert_eq!(cluster.admin_api_key.username, "admin");
    }

    #[test]
    fn test_cluster_with_partial_registry_is_corrupt() {
        let mut row = cluster_row();
        row.schema_registry_id = Some("lsrc-1".to_string());

        assert!(matches!(
            Cluster::try_from(row),
            Err(PersistenceError::Corrupt { table: "cluster", .. })
        ));
    }
}
