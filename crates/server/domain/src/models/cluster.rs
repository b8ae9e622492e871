use crate::ClusterId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential pair issued by the platform.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub username: String,
    pub password: String,
}

impl ApiKey {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Connection data for one Kafka cluster and its schema registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    /// Cluster REST endpoint, e.g. `https://pkc-xyz.eu-west-1.aws.confluent.cloud:443`
    pub admin_api_endpoint: String,
    pub admin_api_key: ApiKey,
    pub bootstrap_endpoint: String,
    pub organization_id: String,
    pub environment_id: String,
    pub schema_registry: Option<SchemaRegistry>,
}

/// Schema registry attached to a cluster's environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    /// Resource id, e.g. `lsrc-abc12`
    pub id: String,
    pub api_endpoint: String,
    pub api_key: ApiKey,
}
