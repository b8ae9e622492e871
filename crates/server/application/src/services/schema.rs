use confluent_gateway_domain::{
    ClusterId, ConfluentApi, ConfluentError, DomainResult, SchemaProcess, Topic, UnitOfWork,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Registers and removes message-contract schemas.
#[derive(Clone)]
pub struct SchemaService {
    confluent: Arc<dyn ConfluentApi>,
}

impl SchemaService {
    pub fn new(confluent: Arc<dyn ConfluentApi>) -> Self {
        Self { confluent }
    }

    /// Raw platform outcome; callers classify rejections.
    pub async fn register_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        schema: &str,
    ) -> Result<(), ConfluentError> {
        self.confluent
            .register_schema(cluster_id, subject, schema)
            .await
    }

    /// Deletes every schema registered for `topic`, at the platform and
    /// locally. Missing subjects and clusters without a registry are skipped.
    pub async fn delete_schemas(&self, uow: &mut dyn UnitOfWork, topic: &Topic) -> DomainResult<()> {
        let schemas = uow.list_schema_processes(&topic.id).await?;

        for schema in &schemas {
            self.delete_schema(&topic.cluster_id, &topic.name, schema).await?;
            uow.delete_schema_process(schema.id).await?;
        }

        if !schemas.is_empty() {
            info!(topic_id = %topic.id, count = schemas.len(), "Topic schemas deleted");
        }
        Ok(())
    }

    async fn delete_schema(
        &self,
        cluster_id: &ClusterId,
        topic_name: &str,
        schema: &SchemaProcess,
    ) -> DomainResult<()> {
        let subject = schema.subject(topic_name);

        match self
            .confluent
            .delete_schema(cluster_id, &subject, schema.schema_version)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(subject = %subject, version = schema.schema_version, "Schema already absent");
                Ok(())
            }
            Err(ConfluentError::SchemaRegistryNotConfigured { .. }) => {
                warn!(cluster_id = %cluster_id, subject = %subject, "No schema registry, nothing to delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
