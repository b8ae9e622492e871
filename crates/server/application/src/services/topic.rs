use confluent_gateway_domain::{
    ClusterId, ConfluentApi, DomainResult, Topic, TopicSpec, UnitOfWork,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Creates and deletes topics at the platform and keeps the local record.
#[derive(Clone)]
pub struct TopicService {
    confluent: Arc<dyn ConfluentApi>,
}

impl TopicService {
    pub fn new(confluent: Arc<dyn ConfluentApi>) -> Self {
        Self { confluent }
    }

    pub async fn create_topic(&self, uow: &mut dyn UnitOfWork, topic: &Topic) -> DomainResult<()> {
        self.confluent
            .create_topic(&topic.cluster_id, &topic.spec())
            .await?;
        uow.create_topic(topic).await?;

        info!(
            topic_id = %topic.id,
            topic_name = %topic.name,
            cluster_id = %topic.cluster_id,
            "Topic created"
        );
        Ok(())
    }

    /// Removes the topic at the platform and locally; a topic already gone at
    /// the platform is tolerated.
    pub async fn delete_topic(&self, uow: &mut dyn UnitOfWork, topic: &Topic) -> DomainResult<()> {
        self.delete_at_platform(&topic.cluster_id, &topic.spec()).await?;
        uow.delete_topic(&topic.id).await?;

        info!(topic_id = %topic.id, topic_name = %topic.name, "Topic deleted");
        Ok(())
    }

    async fn delete_at_platform(&self, cluster_id: &ClusterId, spec: &TopicSpec) -> DomainResult<()> {
        match self.confluent.delete_topic(cluster_id, &spec.name).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(cluster_id = %cluster_id, topic_name = %spec.name, "Topic already absent at the platform");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
