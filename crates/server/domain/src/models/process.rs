//! Persisted progress of the topic and schema sagas.
//!
//! A process row is the only record of what remains to be done. Every
//! attempt reloads it and re-checks its markers; `completed_at` is set at
//! most once.

use super::topic::{Topic, TopicSpec};
use crate::{CapabilityId, ClusterId, MessageContractId, TopicId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn complete_once(completed_at: &mut Option<DateTime<Utc>>) {
    if completed_at.is_none() {
        *completed_at = Some(Utc::now());
    }
}

// =============================================================================
// Create topic
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProcess {
    pub id: Uuid,
    pub capability_id: CapabilityId,
    pub cluster_id: ClusterId,
    pub topic_id: TopicId,
    pub topic_name: String,
    pub partitions: i32,
    pub retention_ms: i64,
    pub has_service_account: bool,
    pub has_cluster_access: bool,
    pub has_api_key: bool,
    pub has_api_key_in_vault: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CreateProcess {
    pub fn new(
        capability_id: CapabilityId,
        cluster_id: ClusterId,
        topic_id: TopicId,
        topic: TopicSpec,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            capability_id,
            cluster_id,
            topic_id,
            topic_name: topic.name,
            partitions: topic.partitions,
            retention_ms: topic.retention_ms,
            has_service_account: false,
            has_cluster_access: false,
            has_api_key: false,
            has_api_key_in_vault: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn topic_spec(&self) -> TopicSpec {
        TopicSpec {
            name: self.topic_name.clone(),
            partitions: self.partitions,
            retention_ms: self.retention_ms,
        }
    }

    /// Local topic row recorded once the platform has created it.
    pub fn to_topic(&self) -> Topic {
        Topic {
            id: self.topic_id.clone(),
            capability_id: self.capability_id.clone(),
            cluster_id: self.cluster_id.clone(),
            name: self.topic_name.clone(),
            partitions: self.partitions,
            retention_ms: self.retention_ms,
            created_at: Utc::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn mark_as_completed(&mut self) {
        complete_once(&mut self.completed_at);
    }
}

// =============================================================================
// Delete topic
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteProcess {
    pub id: Uuid,
    pub topic_id: TopicId,
    pub capability_id: CapabilityId,
    pub cluster_id: ClusterId,
    pub topic_name: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeleteProcess {
    pub fn new(topic: &Topic) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic_id: topic.id.clone(),
            capability_id: topic.capability_id.clone(),
            cluster_id: topic.cluster_id.clone(),
            topic_name: topic.name.clone(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn mark_as_completed(&mut self) {
        complete_once(&mut self.completed_at);
    }
}

// =============================================================================
// Schema registration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProcess {
    pub id: Uuid,
    pub message_contract_id: MessageContractId,
    pub topic_id: TopicId,
    pub message_type: String,
    pub description: String,
    /// JSON schema document
    pub schema: String,
    /// Subject version the schema is expected to land on
    pub schema_version: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SchemaProcess {
    pub fn new(
        message_contract_id: MessageContractId,
        topic_id: TopicId,
        message_type: impl Into<String>,
        description: impl Into<String>,
        schema: impl Into<String>,
        schema_version: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_contract_id,
            topic_id,
            message_type: message_type.into(),
            description: description.into(),
            schema: schema.into(),
            schema_version,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Registry subject, `{topicName}-{messageType}`.
    pub fn subject(&self, topic_name: &str) -> String {
        format!("{}-{}", topic_name, self.message_type)
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn mark_as_completed(&mut self) {
        complete_once(&mut self.completed_at);
    }
}
