//! Unit of work over one PostgreSQL transaction.

use super::database_error;
use super::rows::{
    AclRow, ClusterAccessRow, CreateProcessRow, DeleteProcessRow, SchemaProcessRow,
    ServiceAccountRow, TopicRow,
};
use async_trait::async_trait;
use confluent_gateway_domain::{
    AclEntry, CapabilityId, ClusterAccess, ClusterId, CreateProcess, DeleteProcess,
    MessageContractId, PersistenceError, SchemaProcess, ServiceAccount, Topic, TopicId, UnitOfWork,
};
use saga_engine_core::outbox::{OutboxEntry, OutboxError, OutboxWriter};
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

const CLUSTER_ACCESS_COLUMNS: &str = "id, service_account_id, user_account_id, cluster_id, \
     capability_id, api_key_name, api_key_secret, created_at";

const CREATE_PROCESS_COLUMNS: &str = "id, capability_id, cluster_id, topic_id, topic_name, \
     partitions, retention_ms, has_service_account, has_cluster_access, has_api_key, \
     has_api_key_in_vault, created_at, completed_at";

const SCHEMA_PROCESS_COLUMNS: &str = "id, message_contract_id, topic_id, message_type, \
     description, schema, schema_version, created_at, completed_at";

/// Open transaction; dropping it without [`UnitOfWork::commit`] rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    async fn load_acl(&mut self, cluster_access_id: Uuid) -> Result<Vec<AclEntry>, PersistenceError> {
        let rows: Vec<AclRow> = sqlx::query_as(
            r#"
            SELECT id, resource_type, resource_name, pattern_type, operation_type,
                   permission_type, created_at
            FROM acl
            WHERE cluster_access_id = $1
            ORDER BY position
            "#,
        )
        .bind(cluster_access_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(AclEntry::try_from).collect()
    }

    async fn load_access(&mut self, row: ClusterAccessRow) -> Result<ClusterAccess, PersistenceError> {
        let acl = self.load_acl(row.id).await?;
        Ok(row.into_access(acl))
    }

    async fn insert_acl(
        &mut self,
        cluster_access_id: Uuid,
        position: i32,
        entry: &AclEntry,
    ) -> Result<(), PersistenceError> {
        let definition = &entry.definition;
        sqlx::query(
            r#"
            INSERT INTO acl (id, cluster_access_id, position, resource_type, resource_name,
                             pattern_type, operation_type, permission_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(cluster_access_id)
        .bind(position)
        .bind(definition.resource_type.as_str())
        .bind(&definition.resource_name)
        .bind(definition.pattern_type.as_str())
        .bind(definition.operation_type.as_str())
        .bind(definition.permission_type.as_str())
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    async fn insert_access(&mut self, access: &ClusterAccess) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO cluster_access (id, service_account_id, user_account_id, cluster_id,
                                        capability_id, api_key_name, api_key_secret, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(access.id)
        .bind(access.service_account_id.as_str())
        .bind(access.user_account_id.as_str())
        .bind(access.cluster_id.as_str())
        .bind(access.capability_id.as_str())
        .bind(&access.api_key.username)
        .bind(&access.api_key.password)
        .bind(access.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;

        for (position, entry) in access.acl.iter().enumerate() {
            self.insert_acl(access.id, position as i32, entry).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl OutboxWriter for PgUnitOfWork {
    async fn add_to_outbox(&mut self, entry: OutboxEntry) -> Result<(), OutboxError> {
        sqlx::query(
            r#"
            INSERT INTO outbox (id, topic, partition_key, payload, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.topic)
        .bind(&entry.partition_key)
        .bind(&entry.payload)
        .bind(entry.occurred_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| OutboxError::Write(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn get_create_process(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        topic_name: &str,
    ) -> Result<Option<CreateProcess>, PersistenceError> {
        let row: Option<CreateProcessRow> = sqlx::query_as(&format!(
            "SELECT {CREATE_PROCESS_COLUMNS} FROM create_process \
             WHERE capability_id = $1 AND cluster_id = $2 AND topic_name = $3 \
               AND completed_at IS NULL \
             ORDER BY created_at LIMIT 1"
        ))
        .bind(capability_id.as_str())
        .bind(cluster_id.as_str())
        .bind(topic_name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        Ok(row.map(CreateProcess::from))
    }

    async fn create_create_process(
        &mut self,
        process: &CreateProcess,
    ) -> Result<(), PersistenceError> {
        sqlx::query(&format!(
            "INSERT INTO create_process ({CREATE_PROCESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(process.id)
        .bind(process.capability_id.as_str())
        .bind(process.cluster_id.as_str())
        .bind(process.topic_id.as_str())
        .bind(&process.topic_name)
        .bind(process.partitions)
        .bind(process.retention_ms)
        .bind(process.has_service_account)
        .bind(process.has_cluster_access)
        .bind(process.has_api_key)
        .bind(process.has_api_key_in_vault)
        .bind(process.created_at)
        .bind(process.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    async fn update_create_process(
        &mut self,
        process: &CreateProcess,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            UPDATE create_process
            SET has_service_account = $2, has_cluster_access = $3, has_api_key = $4,
                has_api_key_in_vault = $5, completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(process.id)
        .bind(process.has_service_account)
        .bind(process.has_cluster_access)
        .bind(process.has_api_key)
        .bind(process.has_api_key_in_vault)
        .bind(process.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    async fn get_delete_process(
        &mut self,
        topic_id: &TopicId,
    ) -> Result<Option<DeleteProcess>, PersistenceError> {
        let row: Option<DeleteProcessRow> = sqlx::query_as(
            r#"
            SELECT id, topic_id, capability_id, cluster_id, topic_name, created_at, completed_at
            FROM delete_process
            WHERE topic_id = $1 AND completed_at IS NULL
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(topic_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        Ok(row.map(DeleteProcess::from))
    }

    async fn create_delete_process(
        &mut self,
        process: &DeleteProcess,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO delete_process (id, topic_id, capability_id, cluster_id, topic_name,
                                        created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(process.id)
        .bind(process.topic_id.as_str())
        .bind(process.capability_id.as_str())
        .bind(process.cluster_id.as_str())
        .bind(&process.topic_name)
        .bind(process.created_at)
        .bind(process.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    async fn update_delete_process(
        &mut self,
        process: &DeleteProcess,
    ) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE delete_process SET completed_at = $2 WHERE id = $1")
            .bind(process.id)
            .bind(process.completed_at)
            .execute(&mut *self.tx)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn get_schema_process(
        &mut self,
        message_contract_id: &MessageContractId,
    ) -> Result<Option<SchemaProcess>, PersistenceError> {
        let row: Option<SchemaProcessRow> = sqlx::query_as(&format!(
            "SELECT {SCHEMA_PROCESS_COLUMNS} FROM schema_process WHERE message_contract_id = $1"
        ))
        .bind(message_contract_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        Ok(row.map(SchemaProcess::from))
    }

    async fn list_schema_processes(
        &mut self,
        topic_id: &TopicId,
    ) -> Result<Vec<SchemaProcess>, PersistenceError> {
        let rows: Vec<SchemaProcessRow> = sqlx::query_as(&format!(
            "SELECT {SCHEMA_PROCESS_COLUMNS} FROM schema_process \
             WHERE topic_id = $1 ORDER BY created_at"
        ))
        .bind(topic_id.as_str())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(database_error)?;

        Ok(rows.into_iter().map(SchemaProcess::from).collect())
    }

    async fn create_schema_process(
        &mut self,
        process: &SchemaProcess,
    ) -> Result<(), PersistenceError> {
        sqlx::query(&format!(
            "INSERT INTO schema_process ({SCHEMA_PROCESS_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(process.id)
        .bind(process.message_contract_id.as_str())
        .bind(process.topic_id.as_str())
        .bind(&process.message_type)
        .bind(&process.description)
        .bind(&process.schema)
        .bind(process.schema_version)
        .bind(process.created_at)
        .bind(process.completed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    async fn update_schema_process(
        &mut self,
        process: &SchemaProcess,
    ) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE schema_process SET completed_at = $2 WHERE id = $1")
            .bind(process.id)
            .bind(process.completed_at)
            .execute(&mut *self.tx)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn delete_schema_process(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM schema_process WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn get_service_account(
        &mut self,
        capability_id: &CapabilityId,
    ) -> Result<Option<ServiceAccount>, PersistenceError> {
        let row: Option<ServiceAccountRow> = sqlx::query_as(
            r#"
            SELECT id, capability_id, user_account_id, created_at
            FROM service_account
            WHERE capability_id = $1
            "#,
        )
        .bind(capability_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let access_rows: Vec<ClusterAccessRow> = sqlx::query_as(&format!(
            "SELECT {CLUSTER_ACCESS_COLUMNS} FROM cluster_access \
             WHERE service_account_id = $1 ORDER BY created_at"
        ))
        .bind(&row.id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(database_error)?;

        let mut accesses = Vec::with_capacity(access_rows.len());
        for access_row in access_rows {
            accesses.push(self.load_access(access_row).await?);
        }

        Ok(Some(row.into_account(accesses)))
    }

    async fn create_service_account(
        &mut self,
        account: &ServiceAccount,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO service_account (id, capability_id, user_account_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(account.id.as_str())
        .bind(account.capability_id.as_str())
        .bind(account.user_account_id.as_str())
        .bind(account.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;

        for access in &account.cluster_accesses {
            self.insert_access(access).await?;
        }

        debug!(
            service_account_id = %account.id,
            capability_id = %account.capability_id,
            "Stored service account"
        );
        Ok(())
    }

    async fn get_cluster_access(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> Result<Option<ClusterAccess>, PersistenceError> {
        let row: Option<ClusterAccessRow> = sqlx::query_as(&format!(
            "SELECT {CLUSTER_ACCESS_COLUMNS} FROM cluster_access \
             WHERE capability_id = $1 AND cluster_id = $2"
        ))
        .bind(capability_id.as_str())
        .bind(cluster_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        match row {
            Some(row) => Ok(Some(self.load_access(row).await?)),
            None => Ok(None),
        }
    }

    async fn create_cluster_access(
        &mut self,
        access: &ClusterAccess,
    ) -> Result<(), PersistenceError> {
        self.insert_access(access).await
    }

    async fn update_cluster_access(
        &mut self,
        access: &ClusterAccess,
    ) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE cluster_access SET api_key_name = $2, api_key_secret = $3 WHERE id = $1")
            .bind(access.id)
            .bind(&access.api_key.username)
            .bind(&access.api_key.password)
            .execute(&mut *self.tx)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn update_acl_entry(
        &mut self,
        cluster_access_id: Uuid,
        entry: &AclEntry,
    ) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE acl SET created_at = $3 WHERE id = $1 AND cluster_access_id = $2")
            .bind(entry.id)
            .bind(cluster_access_id)
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn get_topic(&mut self, topic_id: &TopicId) -> Result<Option<Topic>, PersistenceError> {
        let row: Option<TopicRow> = sqlx::query_as(
            r#"
            SELECT id, capability_id, cluster_id, name, partitions, retention_ms, created_at
            FROM topic
            WHERE id = $1
            "#,
        )
        .bind(topic_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        Ok(row.map(Topic::from))
    }

    async fn get_topic_by_name(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        name: &str,
    ) -> Result<Option<Topic>, PersistenceError> {
        let row: Option<TopicRow> = sqlx::query_as(
            r#"
            SELECT id, capability_id, cluster_id, name, partitions, retention_ms, created_at
            FROM topic
            WHERE capability_id = $1 AND cluster_id = $2 AND name = $3
            "#,
        )
        .bind(capability_id.as_str())
        .bind(cluster_id.as_str())
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(database_error)?;

        Ok(row.map(Topic::from))
    }

    async fn create_topic(&mut self, topic: &Topic) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO topic (id, capability_id, cluster_id, name, partitions, retention_ms, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(topic.id.as_str())
        .bind(topic.capability_id.as_str())
        .bind(topic.cluster_id.as_str())
        .bind(&topic.name)
        .bind(topic.partitions)
        .bind(topic.retention_ms)
        .bind(topic.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(database_error)?;
        Ok(())
    }

    async fn delete_topic(&mut self, topic_id: &TopicId) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM topic WHERE id = $1")
            .bind(topic_id.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PersistenceError> {
        self.tx
            .commit()
            .await
            .map_err(|e| PersistenceError::Commit(e.to_string()))
    }
}
