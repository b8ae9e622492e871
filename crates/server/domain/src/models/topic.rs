use crate::{CapabilityId, ClusterId, TopicId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partitions, retention and name of a topic to create at the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    /// Retention in milliseconds; `-1` keeps data forever
    pub retention_ms: i64,
}

/// Local record of a topic that exists at the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub capability_id: CapabilityId,
    pub cluster_id: ClusterId,
    pub name: String,
    pub partitions: i32,
    pub retention_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl Topic {
    pub fn spec(&self) -> TopicSpec {
        TopicSpec {
            name: self.name.clone(),
            partitions: self.partitions,
            retention_ms: self.retention_ms,
        }
    }
}
