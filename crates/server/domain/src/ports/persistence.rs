//! Transactional persistence port.
//!
//! A [`UnitOfWork`] is one open transaction. Changes become visible when
//! [`UnitOfWork::commit`] succeeds; dropping the unit of work without
//! committing discards them, outbox entries included.

use crate::error::PersistenceError;
use crate::models::{
    AclEntry, ClusterAccess, CreateProcess, DeleteProcess, SchemaProcess, ServiceAccount, Topic,
};
use crate::{CapabilityId, ClusterId, MessageContractId, TopicId};
use async_trait::async_trait;
use saga_engine_core::outbox::OutboxWriter;
use uuid::Uuid;

#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, PersistenceError>;
}

#[async_trait]
pub trait UnitOfWork: OutboxWriter + Send {
    // -- create topic process --------------------------------------------------

    /// The non-completed process for a topic request, if any.
    async fn get_create_process(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        topic_name: &str,
    ) -> Result<Option<CreateProcess>, PersistenceError>;

    async fn create_create_process(&mut self, process: &CreateProcess)
    -> Result<(), PersistenceError>;

    async fn update_create_process(&mut self, process: &CreateProcess)
    -> Result<(), PersistenceError>;

    // -- delete topic process --------------------------------------------------

    /// The non-completed deletion of a topic, if any.
    async fn get_delete_process(
        &mut self,
        topic_id: &TopicId,
    ) -> Result<Option<DeleteProcess>, PersistenceError>;

    async fn create_delete_process(&mut self, process: &DeleteProcess)
    -> Result<(), PersistenceError>;

    async fn update_delete_process(&mut self, process: &DeleteProcess)
    -> Result<(), PersistenceError>;

    // -- schema process --------------------------------------------------------

    async fn get_schema_process(
        &mut self,
        message_contract_id: &MessageContractId,
    ) -> Result<Option<SchemaProcess>, PersistenceError>;

    async fn list_schema_processes(
        &mut self,
        topic_id: &TopicId,
    ) -> Result<Vec<SchemaProcess>, PersistenceError>;

    async fn create_schema_process(&mut self, process: &SchemaProcess)
    -> Result<(), PersistenceError>;

    async fn update_schema_process(&mut self, process: &SchemaProcess)
    -> Result<(), PersistenceError>;

    async fn delete_schema_process(&mut self, id: Uuid) -> Result<(), PersistenceError>;

    // -- service accounts ------------------------------------------------------

    /// The capability's account with all of its cluster accesses.
    async fn get_service_account(
        &mut self,
        capability_id: &CapabilityId,
    ) -> Result<Option<ServiceAccount>, PersistenceError>;

    /// Stores the account together with its cluster accesses and ACL entries.
    async fn create_service_account(
        &mut self,
        account: &ServiceAccount,
    ) -> Result<(), PersistenceError>;

    async fn get_cluster_access(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> Result<Option<ClusterAccess>, PersistenceError>;

    /// Stores a new access together with its ACL entries.
    async fn create_cluster_access(&mut self, access: &ClusterAccess)
    -> Result<(), PersistenceError>;

    /// Updates the access's API key.
    async fn update_cluster_access(&mut self, access: &ClusterAccess)
    -> Result<(), PersistenceError>;

    async fn update_acl_entry(
        &mut self,
        cluster_access_id: Uuid,
        entry: &AclEntry,
    ) -> Result<(), PersistenceError>;

    // -- topics ----------------------------------------------------------------

    async fn get_topic(&mut self, topic_id: &TopicId) -> Result<Option<Topic>, PersistenceError>;

    async fn get_topic_by_name(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        name: &str,
    ) -> Result<Option<Topic>, PersistenceError>;

    async fn create_topic(&mut self, topic: &Topic) -> Result<(), PersistenceError>;

    async fn delete_topic(&mut self, topic_id: &TopicId) -> Result<(), PersistenceError>;

    async fn commit(self: Box<Self>) -> Result<(), PersistenceError>;
}
