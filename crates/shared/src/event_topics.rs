//! Centralized Kafka topic and event type names
//!
//! Single source of truth for the topics the gateway consumes from and the
//! topics its outbox relay produces to, so publishers and consumers agree.
//!
//! ## Naming Convention
//! - Topics: `cloudengineering.{service}.{entity}`
//! - Event types: kebab-case past tense (`topic-provisioned`) or request
//!   form (`topic-requested`)

/// Inbound topics produced by the self-service platform
pub mod selfservice {
    /// Topic requests and topic deletion requests
    pub const KAFKA_TOPIC: &str = "cloudengineering.selfservice.kafkatopic";
    /// Message contract (schema) requests
    pub const MESSAGE_CONTRACT: &str = "cloudengineering.selfservice.messagecontract";
    /// Cluster access requests for a capability
    pub const KAFKA_CLUSTER_ACCESS: &str = "cloudengineering.selfservice.kafkaclusteraccess";

    /// All inbound topics, in subscription order
    pub const ALL: [&str; 3] = [KAFKA_TOPIC, MESSAGE_CONTRACT, KAFKA_CLUSTER_ACCESS];
}

/// Outbound topics produced by the gateway
pub mod gateway {
    /// Topic provisioning lifecycle events
    pub const PROVISIONING: &str = "cloudengineering.confluentgateway.provisioning";
    /// Schema registration outcomes
    pub const SCHEMA: &str = "cloudengineering.confluentgateway.schema";
}

/// Event type names carried in the message envelope
pub mod event_types {
    pub const TOPIC_REQUESTED: &str = "topic-requested";
    pub const TOPIC_DELETION_REQUESTED: &str = "topic-deletion-requested";
    pub const MESSAGE_CONTRACT_REQUESTED: &str = "message-contract-requested";
    pub const CLUSTER_ACCESS_REQUESTED: &str = "cluster-access-requested";

    pub const TOPIC_PROVISIONING_BEGUN: &str = "topic-provisioning-begun";
    pub const TOPIC_PROVISIONED: &str = "topic-provisioned";
    pub const TOPIC_DELETED: &str = "topic-deleted";
    pub const SCHEMA_REGISTERED: &str = "schema-registered";
    pub const SCHEMA_REGISTRATION_FAILED: &str = "schema-registration-failed";
}
