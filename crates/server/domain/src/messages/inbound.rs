//! Requests published by the self-service platform.

use crate::{CapabilityId, ClusterId, MessageContractId, TopicId};
use serde::{Deserialize, Serialize};

fn default_partitions() -> i32 {
    1
}

fn default_retention() -> i64 {
    604_800_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequested {
    pub topic_id: TopicId,
    pub topic_name: String,
    pub capability_id: CapabilityId,
    pub cluster_id: ClusterId,
    #[serde(default = "default_partitions")]
    pub partitions: i32,
    /// Retention in milliseconds
    #[serde(default = "default_retention")]
    pub retention: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDeletionRequested {
    pub topic_id: TopicId,
    #[serde(default)]
    pub topic_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContractRequested {
    pub message_contract_id: MessageContractId,
    pub topic_id: TopicId,
    pub message_type: String,
    #[serde(default)]
    pub description: String,
    pub schema: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: i32,
}

fn default_schema_version() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountAccessRequested {
    pub capability_id: CapabilityId,
    pub cluster_id: ClusterId,
}
