use crate::ClusterId;
use crate::error::PersistenceError;
use crate::models::Cluster;
use async_trait::async_trait;

/// Read access to the clusters the gateway manages.
#[async_trait]
pub trait ClusterCatalog: Send + Sync {
    async fn get_cluster(&self, cluster_id: &ClusterId) -> Result<Option<Cluster>, PersistenceError>;

    async fn list_clusters(&self) -> Result<Vec<Cluster>, PersistenceError>;
}
