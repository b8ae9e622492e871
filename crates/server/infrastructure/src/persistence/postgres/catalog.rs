use super::database_error;
use super::rows::ClusterRow;
use async_trait::async_trait;
use confluent_gateway_domain::{Cluster, ClusterCatalog, ClusterId, PersistenceError};
use sqlx::postgres::PgPool;

const CLUSTER_COLUMNS: &str = "id, name, admin_api_endpoint, admin_api_key_name, \
     admin_api_key_secret, bootstrap_endpoint, organization_id, environment_id, \
     schema_registry_id, schema_registry_api_endpoint, schema_registry_api_key_name, \
     schema_registry_api_key_secret";

/// Clusters read from the `cluster` table. Rows are maintained by operators.
#[derive(Debug, Clone)]
pub struct PgClusterCatalog {
    pool: PgPool,
}

impl PgClusterCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClusterCatalog for PgClusterCatalog {
    async fn get_cluster(&self, cluster_id: &ClusterId) -> Result<Option<Cluster>, PersistenceError> {
        let row: Option<ClusterRow> =
            sqlx::query_as(&format!("SELECT {CLUSTER_COLUMNS} FROM cluster WHERE id = $1"))
                .bind(cluster_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error)?;

        row.map(Cluster::try_from).transpose()
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>, PersistenceError> {
        let rows: Vec<ClusterRow> =
            sqlx::query_as(&format!("SELECT {CLUSTER_COLUMNS} FROM cluster ORDER BY name"))
                .fetch_all(&self.pool)
                .await
                .map_err(database_error)?;

        rows.into_iter().map(Cluster::try_from).collect()
    }
}
