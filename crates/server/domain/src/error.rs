use crate::{CapabilityId, ClusterId, ServiceAccountId, TopicId};
use saga_engine_core::outbox::OutboxError;
use thiserror::Error;

/// Errors returned by the platform control-plane client.
#[derive(Debug, Error)]
pub enum ConfluentError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform answered with a non-success status.
    #[error("Request to {url} rejected with status {status_code}: {body}")]
    ClientRejection {
        url: String,
        status_code: u16,
        body: String,
    },

    #[error("No schema registry is configured for cluster {cluster_id}")]
    SchemaRegistryNotConfigured { cluster_id: ClusterId },

    #[error("A service account named {display_name} already exists")]
    ServiceAccountAlreadyExists { display_name: String },

    #[error("Cluster {cluster_id} is not known")]
    UnknownCluster { cluster_id: ClusterId },

    #[error("Unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

impl ConfluentError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ClientRejection { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ServiceAccountAlreadyExists { .. }) || self.status_code() == Some(409)
    }

    /// 4xx answer: the platform understood and refused the request.
    pub fn is_client_rejection(&self) -> bool {
        self.status_code()
            .is_some_and(|status| (400..500).contains(&status))
    }
}

/// Errors returned by the secret store.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Secret store error: {0}")]
    Backend(String),

    #[error("Secret serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the persistence adapters.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    #[error("Commit failed: {0}")]
    Commit(String),
}

/// Domain error type shared by every saga.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Confluent(#[from] ConfluentError),

    #[error(transparent)]
    SecretStore(#[from] SecretStoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Outbox(#[from] OutboxError),

    #[error("Topic not found: {topic_id}")]
    TopicNotFound { topic_id: TopicId },

    #[error("Service account for capability {capability_id} not found")]
    ServiceAccountNotFound { capability_id: CapabilityId },

    #[error("Cluster access for capability {capability_id} on cluster {cluster_id} not found")]
    ClusterAccessNotFound {
        capability_id: CapabilityId,
        cluster_id: ClusterId,
    },

    #[error("No internal user owns service account {service_account_id}")]
    UserAccountNotFound { service_account_id: ServiceAccountId },

    #[error("Internal user of service account {service_account_id} is deactivated")]
    UserAccountDeactivated { service_account_id: ServiceAccountId },

    #[error("Service account {display_name} exists at the platform but could not be found")]
    ServiceAccountNotResolved { display_name: String },

    #[error("Cluster access for capability {capability_id} on cluster {cluster_id} has no API key")]
    ApiKeyMissing {
        capability_id: CapabilityId,
        cluster_id: ClusterId,
    },
}

impl DomainError {
    /// The cluster has no schema registry to act on.
    pub fn is_schema_registry_missing(&self) -> bool {
        matches!(
            self,
            Self::Confluent(ConfluentError::SchemaRegistryNotConfigured { .. })
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
