//! Events staged in the outbox.

use crate::{CapabilityId, ClusterId, MessageContractId, TopicId};
use confluent_gateway_shared::{event_types, gateway};
use saga_engine_core::outbox::{OutboxError, OutgoingMessage, TransactionalOutbox};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProvisioningBegun {
    pub topic_id: TopicId,
    pub topic_name: String,
    pub cluster_id: ClusterId,
    pub capability_id: CapabilityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProvisioned {
    pub topic_id: TopicId,
    pub topic_name: String,
    pub cluster_id: ClusterId,
    pub capability_id: CapabilityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDeleted {
    pub topic_id: TopicId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistered {
    pub message_contract_id: MessageContractId,
    pub topic_id: TopicId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistrationFailed {
    pub message_contract_id: MessageContractId,
    pub topic_id: TopicId,
    pub reason: String,
}

impl OutgoingMessage for TopicProvisioningBegun {
    fn partition_key(&self) -> String {
        self.topic_id.to_string()
    }
}

impl OutgoingMessage for TopicProvisioned {
    fn partition_key(&self) -> String {
        self.topic_id.to_string()
    }
}

impl OutgoingMessage for TopicDeleted {
    fn partition_key(&self) -> String {
        self.topic_id.to_string()
    }
}

impl OutgoingMessage for SchemaRegistered {
    fn partition_key(&self) -> String {
        self.message_contract_id.to_string()
    }
}

impl OutgoingMessage for SchemaRegistrationFailed {
    fn partition_key(&self) -> String {
        self.message_contract_id.to_string()
    }
}

/// Registers every event above against its topic and event type.
pub fn register_outgoing_messages(outbox: &mut TransactionalOutbox) -> Result<(), OutboxError> {
    outbox.register::<TopicProvisioningBegun>(
        gateway::PROVISIONING,
        event_types::TOPIC_PROVISIONING_BEGUN,
    )?;
    outbox.register::<TopicProvisioned>(gateway::PROVISIONING, event_types::TOPIC_PROVISIONED)?;
    outbox.register::<TopicDeleted>(gateway::PROVISIONING, event_types::TOPIC_DELETED)?;
    outbox.register::<SchemaRegistered>(gateway::SCHEMA, event_types::SCHEMA_REGISTERED)?;
    outbox.register::<SchemaRegistrationFailed>(
        gateway::SCHEMA,
        event_types::SCHEMA_REGISTRATION_FAILED,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_outgoing_messages_routes_by_concern() {
        let mut outbox = TransactionalOutbox::new();
        register_outgoing_messages(&mut outbox).unwrap();

        assert_eq!(
            outbox.registration::<TopicProvisioned>(),
            Some((gateway::PROVISIONING, event_types::TOPIC_PROVISIONED))
        );
        assert_eq!(
            outbox.registration::<SchemaRegistrationFailed>(),
            Some((gateway::SCHEMA, event_types::SCHEMA_REGISTRATION_FAILED))
        );
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut outbox = TransactionalOutbox::new();
        register_outgoing_messages(&mut outbox).unwrap();

        assert!(register_outgoing_messages(&mut outbox).is_err());
    }
}
