//! In-memory implementation of the persistence ports.
//!
//! Each unit of work holds the database lock until it commits or is dropped,
//! so transactions are serialized. Writes go to a private copy of the state
//! that replaces the shared state on commit.

use async_trait::async_trait;
use chrono::Utc;
use confluent_gateway_domain::{
    AclEntry, CapabilityId, ClusterAccess, ClusterId, CreateProcess, Database, DeleteProcess,
    MessageContractId, PersistenceError, SchemaProcess, ServiceAccount, Topic, TopicId, UnitOfWork,
};
use saga_engine_core::outbox::{OutboxEntry, OutboxError, OutboxRepository, OutboxWriter};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    create_processes: Vec<CreateProcess>,
    delete_processes: Vec<DeleteProcess>,
    schema_processes: Vec<SchemaProcess>,
    service_accounts: HashMap<CapabilityId, ServiceAccount>,
    topics: HashMap<TopicId, Topic>,
    outbox: Vec<OutboxEntry>,
}

impl MemoryState {
    fn cluster_access_mut(&mut self, id: Uuid) -> Option<&mut ClusterAccess> {
        self.service_accounts
            .values_mut()
            .flat_map(|account| account.cluster_accesses.iter_mut())
            .find(|access| access.id == id)
    }
}

#[derive(Debug, Error)]
#[error("Outbox entry {0} not found")]
pub struct MemoryOutboxError(Uuid);

/// Process-local database used by tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail and discard its changes.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn insert_topic(&self, topic: Topic) {
        self.state.lock().await.topics.insert(topic.id.clone(), topic);
    }

    pub async fn insert_service_account(&self, account: ServiceAccount) {
        self.state
            .lock()
            .await
            .service_accounts
            .insert(account.capability_id.clone(), account);
    }

    pub async fn topics(&self) -> Vec<Topic> {
        self.state.lock().await.topics.values().cloned().collect()
    }

    pub async fn service_account(&self, capability_id: &CapabilityId) -> Option<ServiceAccount> {
        self.state
            .lock()
            .await
            .service_accounts
            .get(capability_id)
            .cloned()
    }

    pub async fn create_processes(&self) -> Vec<CreateProcess> {
        self.state.lock().await.create_processes.clone()
    }

    pub async fn delete_processes(&self) -> Vec<DeleteProcess> {
        self.state.lock().await.delete_processes.clone()
    }

    pub async fn schema_processes(&self) -> Vec<SchemaProcess> {
        self.state.lock().await.schema_processes.clone()
    }

    /// Outbox entries in insertion order.
    pub async fn outbox_entries(&self) -> Vec<OutboxEntry> {
        self.state.lock().await.outbox.clone()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, PersistenceError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemoryUnitOfWork {
            guard,
            working,
            fail_commit: self.fail_next_commit.clone(),
        }))
    }
}

#[async_trait]
impl OutboxRepository for InMemoryDatabase {
    type Error = MemoryOutboxError;

    async fn get_unprocessed(&self, batch_size: usize) -> Result<Vec<OutboxEntry>, Self::Error> {
        let state = self.state.lock().await;
        Ok(state
            .outbox
            .iter()
            .filter(|entry| !entry.is_processed())
            .take(batch_size)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), Self::Error> {
        let mut state = self.state.lock().await;
        let entry = state
            .outbox
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(MemoryOutboxError(id))?;
        entry.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn unprocessed_count(&self) -> Result<u64, Self::Error> {
        let state = self.state.lock().await;
        Ok(state.outbox.iter().filter(|e| !e.is_processed()).count() as u64)
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_commit: Arc<AtomicBool>,
}

#[async_trait]
impl OutboxWriter for MemoryUnitOfWork {
    async fn add_to_outbox(&mut self, entry: OutboxEntry) -> Result<(), OutboxError> {
        self.working.outbox.push(entry);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn get_create_process(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        topic_name: &str,
    ) -> Result<Option<CreateProcess>, PersistenceError> {
        Ok(self
            .working
            .create_processes
            .iter()
            .find(|p| {
                !p.is_completed()
                    && &p.capability_id == capability_id
                    && &p.cluster_id == cluster_id
                    && p.topic_name == topic_name
            })
            .cloned())
    }

    async fn create_create_process(
        &mut self,
        process: &CreateProcess,
    ) -> Result<(), PersistenceError> {
        self.working.create_processes.push(process.clone());
        Ok(())
    }

    async fn update_create_process(
        &mut self,
        process: &CreateProcess,
    ) -> Result<(), PersistenceError> {
        if let Some(existing) = self
            .working
            .create_processes
            .iter_mut()
            .find(|p| p.id == process.id)
        {
            *existing = process.clone();
        }
        Ok(())
    }

    async fn get_delete_process(
        &mut self,
        topic_id: &TopicId,
    ) -> Result<Option<DeleteProcess>, PersistenceError> {
        Ok(self
            .working
            .delete_processes
            .iter()
            .find(|p| !p.is_completed() && &p.topic_id == topic_id)
            .cloned())
    }

    async fn create_delete_process(
        &mut self,
        process: &DeleteProcess,
    ) -> Result<(), PersistenceError> {
        self.working.delete_processes.push(process.clone());
        Ok(())
    }

    async fn update_delete_process(
        &mut self,
        process: &DeleteProcess,
    ) -> Result<(), PersistenceError> {
        if let Some(existing) = self
            .working
            .delete_processes
            .iter_mut()
            .find(|p| p.id == process.id)
        {
            *existing = process.clone();
        }
        Ok(())
    }

    async fn get_schema_process(
        &mut self,
        message_contract_id: &MessageContractId,
    ) -> Result<Option<SchemaProcess>, PersistenceError> {
        Ok(self
            .working
            .schema_processes
            .iter()
            .find(|p| &p.message_contract_id == message_contract_id)
            .cloned())
    }

    async fn list_schema_processes(
        &mut self,
        topic_id: &TopicId,
    ) -> Result<Vec<SchemaProcess>, PersistenceError> {
        Ok(self
            .working
            .schema_processes
            .iter()
            .filter(|p| &p.topic_id == topic_id)
            .cloned()
            .collect())
    }

    async fn create_schema_process(
        &mut self,
        process: &SchemaProcess,
    ) -> Result<(), PersistenceError> {
        self.working.schema_processes.push(process.clone());
        Ok(())
    }

    async fn update_schema_process(
        &mut self,
        process: &SchemaProcess,
    ) -> Result<(), PersistenceError> {
        if let Some(existing) = self
            .working
            .schema_processes
            .iter_mut()
            .find(|p| p.id == process.id)
        {
            *existing = process.clone();
        }
        Ok(())
    }

    async fn delete_schema_process(&mut self, id: Uuid) -> Result<(), PersistenceError> {
        self.working.schema_processes.retain(|p| p.id != id);
        Ok(())
    }

    async fn get_service_account(
        &mut self,
        capability_id: &CapabilityId,
    ) -> Result<Option<ServiceAccount>, PersistenceError> {
        Ok(self.working.service_accounts.get(capability_id).cloned())
    }

    async fn create_service_account(
        &mut self,
        account: &ServiceAccount,
    ) -> Result<(), PersistenceError> {
        if self
            .working
            .service_accounts
            .contains_key(&account.capability_id)
        {
            return Err(PersistenceError::Database(format!(
                "service account for capability {} already exists",
                account.capability_id
            )));
        }
        self.working
            .service_accounts
            .insert(account.capability_id.clone(), account.clone());
        Ok(())
    }

    async fn get_cluster_access(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
    ) -> Result<Option<ClusterAccess>, PersistenceError> {
        Ok(self
            .working
            .service_accounts
            .get(capability_id)
            .and_then(|account| account.cluster_access(cluster_id))
            .cloned())
    }

    async fn create_cluster_access(
        &mut self,
        access: &ClusterAccess,
    ) -> Result<(), PersistenceError> {
        let account = self
            .working
            .service_accounts
            .get_mut(&access.capability_id)
            .ok_or_else(|| {
                PersistenceError::Database(format!(
                    "no service account for capability {}",
                    access.capability_id
                ))
            })?;
        account.cluster_accesses.push(access.clone());
        Ok(())
    }

    async fn update_cluster_access(
        &mut self,
        access: &ClusterAccess,
    ) -> Result<(), PersistenceError> {
        if let Some(existing) = self.working.cluster_access_mut(access.id) {
            existing.api_key = access.api_key.clone();
        }
        Ok(())
    }

    async fn update_acl_entry(
        &mut self,
        cluster_access_id: Uuid,
        entry: &AclEntry,
    ) -> Result<(), PersistenceError> {
        if let Some(existing) = self
            .working
            .cluster_access_mut(cluster_access_id)
            .and_then(|access| access.acl.iter_mut().find(|e| e.id == entry.id))
        {
            existing.created_at = entry.created_at;
        }
        Ok(())
    }

    async fn get_topic(&mut self, topic_id: &TopicId) -> Result<Option<Topic>, PersistenceError> {
        Ok(self.working.topics.get(topic_id).cloned())
    }

    async fn get_topic_by_name(
        &mut self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        name: &str,
    ) -> Result<Option<Topic>, PersistenceError> {
        Ok(self
            .working
            .topics
            .values()
            .find(|t| &t.capability_id == capability_id && &t.cluster_id == cluster_id && t.name == name)
            .cloned())
    }

    async fn create_topic(&mut self, topic: &Topic) -> Result<(), PersistenceError> {
        self.working.topics.insert(topic.id.clone(), topic.clone());
        Ok(())
    }

    async fn delete_topic(&mut self, topic_id: &TopicId) -> Result<(), PersistenceError> {
        self.working.topics.remove(topic_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PersistenceError> {
        let MemoryUnitOfWork {
            mut guard,
            working,
            fail_commit,
        } = *self;

        if fail_commit.swap(false, Ordering::SeqCst) {
            return Err(PersistenceError::Commit("injected commit failure".to_string()));
        }

        *guard = working;
        Ok(())
    }
}
