//! Recording fakes for the platform and the secret store, plus a harness
//! wiring them to the in-memory database.

#![allow(dead_code)]

use async_trait::async_trait;
use confluent_gateway_application::SagaServices;
use confluent_gateway_domain::{
    AclDefinition, ApiKey, ApiKeyDestination, CapabilityId, ClusterId, ConfluentApi,
    ConfluentError, InternalUser, SecretStore, SecretStoreError, ServiceAccountId, TopicSpec,
    UserAccountId, register_outgoing_messages,
};
use confluent_gateway_infrastructure::InMemoryDatabase;
use parking_lot::Mutex;
use saga_engine_core::TransactionalOutbox;
use saga_engine_core::outbox::Envelope;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const CLUSTER: &str = "lkc-4npj6";
pub const CAPABILITY: &str = "sandbox-xyz1";

/// Failure injected into the next call of one operation.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Transport,
    Status(u16),
}

impl Fault {
    fn into_error(self, operation: &str) -> ConfluentError {
        match self {
            Fault::Transport => ConfluentError::Transport(format!("{operation}: connection reset")),
            Fault::Status(status_code) => ConfluentError::ClientRejection {
                url: format!("https://api.confluent.cloud/{operation}"),
                status_code,
                body: "{}".to_string(),
            },
        }
    }
}

#[derive(Default)]
struct PlatformState {
    calls: Vec<String>,
    accounts: HashMap<String, ServiceAccountId>,
    users: Vec<InternalUser>,
    acl: Vec<(ClusterId, UserAccountId, AclDefinition)>,
    cluster_keys: Vec<(ServiceAccountId, ClusterId, String)>,
    registry_keys: Vec<(ServiceAccountId, ClusterId, String)>,
    role_bindings: Vec<(ServiceAccountId, ClusterId)>,
    topics: HashSet<(ClusterId, String)>,
    schemas: Vec<(ClusterId, String, String)>,
    faults: HashMap<String, Fault>,
    clusters_without_registry: HashSet<ClusterId>,
    next_id: i64,
}

/// In-process stand-in for the platform control plane.
#[derive(Default)]
pub struct FakeConfluent {
    state: Mutex<PlatformState>,
}

impl FakeConfluent {
    /// Fails the next call of `operation` (the `ConfluentApi` method name).
    pub fn fail_next(&self, operation: &str, fault: Fault) {
        self.state.lock().faults.insert(operation.to_string(), fault);
    }

    pub fn without_registry(&self, cluster_id: &str) {
        self.state
            .lock()
            .clusters_without_registry
            .insert(ClusterId::new(cluster_id));
    }

    /// Account that exists at the platform but not locally.
    pub fn seed_account(&self, display_name: &str) -> ServiceAccountId {
        let mut state = self.state.lock();
        Self::new_account(&mut state, display_name)
    }

    /// Cluster key issued at the platform whose secret never reached us.
    pub fn seed_cluster_key(&self, service_account_id: &ServiceAccountId) -> String {
        let mut state = self.state.lock();
        let key = Self::issue_key(&mut state);
        state.cluster_keys.push((
            service_account_id.clone(),
            ClusterId::new(CLUSTER),
            key.username.clone(),
        ));
        key.username
    }

    /// Registry key issued at the platform whose secret never reached us.
    pub fn seed_registry_key(&self, service_account_id: &ServiceAccountId) -> String {
        let mut state = self.state.lock();
        let key = Self::issue_key(&mut state);
        state.registry_keys.push((
            service_account_id.clone(),
            ClusterId::new(CLUSTER),
            key.username.clone(),
        ));
        key.username
    }

    pub fn deactivate_users(&self) {
        for user in self.state.lock().users.iter_mut() {
            user.deactivated = true;
        }
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.as_str() == operation)
            .count()
    }

    pub fn acl_entries(&self) -> Vec<AclDefinition> {
        self.state
            .lock()
            .acl
            .iter()
            .map(|(_, _, definition)| definition.clone())
            .collect()
    }

    pub fn acl_principals(&self) -> HashSet<String> {
        self.state
            .lock()
            .acl
            .iter()
            .map(|(_, principal, _)| principal.to_string())
            .collect()
    }

    pub fn cluster_key_count(&self) -> usize {
        self.state.lock().cluster_keys.len()
    }

    pub fn registry_key_count(&self) -> usize {
        self.state.lock().registry_keys.len()
    }

    pub fn role_binding_count(&self) -> usize {
        self.state.lock().role_bindings.len()
    }

    pub fn has_topic(&self, cluster_id: &str, name: &str) -> bool {
        self.state
            .lock()
            .topics
            .contains(&(ClusterId::new(cluster_id), name.to_string()))
    }

    pub fn create_topic_directly(&self, cluster_id: &str, name: &str) {
        self.state
            .lock()
            .topics
            .insert((ClusterId::new(cluster_id), name.to_string()));
    }

    pub fn subjects(&self) -> Vec<String> {
        self.state
            .lock()
            .schemas
            .iter()
            .map(|(_, subject, _)| subject.clone())
            .collect()
    }

    fn new_account(state: &mut PlatformState, display_name: &str) -> ServiceAccountId {
        state.next_id += 1;
        let id = ServiceAccountId::new(format!("sa-{}", state.next_id));
        state.accounts.insert(display_name.to_string(), id.clone());
        state.users.push(InternalUser {
            id: 100_000 + state.next_id,
            resource_id: id.clone(),
            deactivated: false,
        });
        id
    }

    /// Records the call and returns the injected fault, if any.
    fn enter(&self, operation: &str) -> Result<(), ConfluentError> {
        let mut state = self.state.lock();
        state.calls.push(operation.to_string());
        match state.faults.remove(operation) {
            Some(fault) => Err(fault.into_error(operation)),
            None => Ok(()),
        }
    }

    fn require_registry(&self, cluster_id: &ClusterId) -> Result<(), ConfluentError> {
        if self.state.lock().clusters_without_registry.contains(cluster_id) {
            return Err(ConfluentError::SchemaRegistryNotConfigured {
                cluster_id: cluster_id.clone(),
            });
        }
        Ok(())
    }

    fn keys_of(
        keys: &[(ServiceAccountId, ClusterId, String)],
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Vec<String> {
        keys.iter()
            .filter(|(sa, cluster, _)| sa == service_account_id && cluster == cluster_id)
            .map(|(_, _, key)| key.clone())
            .collect()
    }

    fn issue_key(state: &mut PlatformState) -> ApiKey {
        state.next_id += 1;
        ApiKey::new(format!("KEY{}", state.next_id), format!("secret-{}", state.next_id))
    }
}

#[async_trait]
impl ConfluentApi for FakeConfluent {
    async fn create_service_account(
        &self,
        display_name: &str,
        _description: &str,
    ) -> Result<ServiceAccountId, ConfluentError> {
        self.enter("create_service_account")?;
        let mut state = self.state.lock();
        if state.accounts.contains_key(display_name) {
            return Err(ConfluentError::ServiceAccountAlreadyExists {
                display_name: display_name.to_string(),
            });
        }
        Ok(Self::new_account(&mut state, display_name))
    }

    async fn get_service_account_by_display_name(
        &self,
        display_name: &str,
    ) -> Result<Option<ServiceAccountId>, ConfluentError> {
        self.enter("get_service_account_by_display_name")?;
        Ok(self.state.lock().accounts.get(display_name).cloned())
    }

    async fn create_acl_entry(
        &self,
        cluster_id: &ClusterId,
        user_account_id: &UserAccountId,
        entry: &AclDefinition,
    ) -> Result<(), ConfluentError> {
        self.enter("create_acl_entry")?;
        self.state
            .lock()
            .acl
            .push((cluster_id.clone(), user_account_id.clone(), entry.clone()));
        Ok(())
    }

    async fn create_cluster_api_key(
        &self,
        cluster_id: &ClusterId,
        service_account_id: &ServiceAccountId,
    ) -> Result<ApiKey, ConfluentError> {
        self.enter("create_cluster_api_key")?;
        let mut state = self.state.lock();
        let key = Self::issue_key(&mut state);
        state
            .cluster_keys
            .push((service_account_id.clone(), cluster_id.clone(), key.username.clone()));
        Ok(key)
    }

    async fn create_schema_registry_api_key(
        &self,
        cluster_id: &ClusterId,
        service_account_id: &ServiceAccountId,
    ) -> Result<ApiKey, ConfluentError> {
        self.enter("create_schema_registry_api_key")?;
        self.require_registry(cluster_id)?;
        let mut state = self.state.lock();
        let key = Self::issue_key(&mut state);
        state
            .registry_keys
            .push((service_account_id.clone(), cluster_id.clone(), key.username.clone()));
        Ok(key)
    }

    async fn delete_cluster_api_key(
        &self,
        _cluster_id: &ClusterId,
        api_key: &str,
    ) -> Result<(), ConfluentError> {
        self.enter("delete_cluster_api_key")?;
        self.state.lock().cluster_keys.retain(|(_, _, key)| key != api_key);
        Ok(())
    }

    async fn delete_schema_registry_api_key(
        &self,
        _cluster_id: &ClusterId,
        api_key: &str,
    ) -> Result<(), ConfluentError> {
        self.enter("delete_schema_registry_api_key")?;
        self.state.lock().registry_keys.retain(|(_, _, key)| key != api_key);
        Ok(())
    }

    async fn create_service_account_role_binding(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<(), ConfluentError> {
        self.enter("create_service_account_role_binding")?;
        self.require_registry(cluster_id)?;
        self.state
            .lock()
            .role_bindings
            .push((service_account_id.clone(), cluster_id.clone()));
        Ok(())
    }

    async fn create_topic(
        &self,
        cluster_id: &ClusterId,
        topic: &TopicSpec,
    ) -> Result<(), ConfluentError> {
        self.enter("create_topic")?;
        self.state
            .lock()
            .topics
            .insert((cluster_id.clone(), topic.name.clone()));
        Ok(())
    }

    async fn delete_topic(
        &self,
        cluster_id: &ClusterId,
        topic_name: &str,
    ) -> Result<(), ConfluentError> {
        self.enter("delete_topic")?;
        let removed = self
            .state
            .lock()
            .topics
            .remove(&(cluster_id.clone(), topic_name.to_string()));
        if !removed {
            return Err(Fault::Status(404).into_error("delete_topic"));
        }
        Ok(())
    }

    async fn register_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        schema: &str,
    ) -> Result<(), ConfluentError> {
        self.enter("register_schema")?;
        self.require_registry(cluster_id)?;
        self.state
            .lock()
            .schemas
            .push((cluster_id.clone(), subject.to_string(), schema.to_string()));
        Ok(())
    }

    async fn delete_schema(
        &self,
        cluster_id: &ClusterId,
        subject: &str,
        _version: i32,
    ) -> Result<(), ConfluentError> {
        self.enter("delete_schema")?;
        self.require_registry(cluster_id)?;
        let mut state = self.state.lock();
        let before = state.schemas.len();
        state
            .schemas
            .retain(|(cluster, s, _)| !(cluster == cluster_id && s == subject));
        if state.schemas.len() == before {
            return Err(Fault::Status(404).into_error("delete_schema"));
        }
        Ok(())
    }

    async fn count_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<usize, ConfluentError> {
        self.enter("count_cluster_api_keys")?;
        Ok(self
            .state
            .lock()
            .cluster_keys
            .iter()
            .filter(|(sa, cluster, _)| sa == service_account_id && cluster == cluster_id)
            .count())
    }

    async fn count_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<usize, ConfluentError> {
        self.enter("count_schema_registry_api_keys")?;
        self.require_registry(cluster_id)?;
        Ok(self
            .state
            .lock()
            .registry_keys
            .iter()
            .filter(|(sa, cluster, _)| sa == service_account_id && cluster == cluster_id)
            .count())
    }

    async fn list_cluster_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<Vec<String>, ConfluentError> {
        self.enter("list_cluster_api_keys")?;
        Ok(Self::keys_of(&self.state.lock().cluster_keys, service_account_id, cluster_id))
    }

    async fn list_schema_registry_api_keys(
        &self,
        service_account_id: &ServiceAccountId,
        cluster_id: &ClusterId,
    ) -> Result<Vec<String>, ConfluentError> {
        self.enter("list_schema_registry_api_keys")?;
        self.require_registry(cluster_id)?;
        Ok(Self::keys_of(&self.state.lock().registry_keys, service_account_id, cluster_id))
    }

    async fn list_internal_users(&self) -> Result<Vec<InternalUser>, ConfluentError> {
        self.enter("list_internal_users")?;
        Ok(self.state.lock().users.clone())
    }
}

type SecretKey = (CapabilityId, ClusterId, ApiKeyDestination);

/// Secret store keeping keys in memory.
#[derive(Default)]
pub struct FakeSecretStore {
    keys: Mutex<HashMap<SecretKey, ApiKey>>,
    fail_next_store: Mutex<Option<ApiKeyDestination>>,
    stores: Mutex<usize>,
}

impl FakeSecretStore {
    /// Fails the next store of a key for `destination`.
    pub fn fail_next_store(&self, destination: ApiKeyDestination) {
        *self.fail_next_store.lock() = Some(destination);
    }

    pub fn get(&self, destination: ApiKeyDestination) -> Option<ApiKey> {
        self.keys
            .lock()
            .get(&(CapabilityId::new(CAPABILITY), ClusterId::new(CLUSTER), destination))
            .cloned()
    }

    pub fn store_count(&self) -> usize {
        *self.stores.lock()
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn store_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
        api_key: &ApiKey,
    ) -> Result<(), SecretStoreError> {
        *self.stores.lock() += 1;
        {
            let mut fault = self.fail_next_store.lock();
            if *fault == Some(destination) {
                *fault = None;
                return Err(SecretStoreError::Backend("throttled".to_string()));
            }
        }
        self.keys.lock().insert(
            (capability_id.clone(), cluster_id.clone(), destination),
            api_key.clone(),
        );
        Ok(())
    }

    async fn query_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> Result<bool, SecretStoreError> {
        Ok(self
            .keys
            .lock()
            .contains_key(&(capability_id.clone(), cluster_id.clone(), destination)))
    }

    async fn delete_api_key(
        &self,
        capability_id: &CapabilityId,
        cluster_id: &ClusterId,
        destination: ApiKeyDestination,
    ) -> Result<(), SecretStoreError> {
        self.keys
            .lock()
            .remove(&(capability_id.clone(), cluster_id.clone(), destination));
        Ok(())
    }
}

/// Sagas wired to the fakes and the in-memory database.
pub struct Harness {
    pub db: InMemoryDatabase,
    pub confluent: Arc<FakeConfluent>,
    pub secrets: Arc<FakeSecretStore>,
    pub services: SagaServices,
}

impl Harness {
    pub fn new() -> Self {
        let mut outbox = TransactionalOutbox::new();
        register_outgoing_messages(&mut outbox).unwrap();

        let confluent = Arc::new(FakeConfluent::default());
        let secrets = Arc::new(FakeSecretStore::default());
        let services = SagaServices::new(confluent.clone(), secrets.clone(), Arc::new(outbox));

        Self {
            db: InMemoryDatabase::new(),
            confluent,
            secrets,
            services,
        }
    }

    pub fn database(&self) -> Arc<dyn confluent_gateway_domain::Database> {
        Arc::new(self.db.clone())
    }

    /// Envelope types of the staged outbox entries, in order.
    pub async fn outbox_types(&self) -> Vec<String> {
        self.db
            .outbox_entries()
            .await
            .iter()
            .map(|entry| {
                let envelope: Envelope<serde_json::Value> =
                    serde_json::from_str(&entry.payload).unwrap();
                envelope.message_type
            })
            .collect()
    }
}
