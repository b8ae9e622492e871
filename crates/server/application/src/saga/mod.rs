//! # Provisioning sagas
//!
//! Every saga is an immutable [`Steps`] sequence over a [`SagaContext`].
//! [`SagaPerformer`] drives one attempt at a time:
//!
//! 1. Begin a unit of work
//! 2. Build a fresh context from the saga state and the shared services
//! 3. Invoke the step
//! 4. Save the state and commit
//!
//! The in-memory state only advances after a successful commit, so a failed
//! attempt leaves both the database and the next attempt's starting point
//! untouched.

pub mod acl;
pub mod create_topic;
pub mod delete_topic;
pub mod schema_registration;
pub mod service_account;

pub use create_topic::CreateTopicProcess;
pub use delete_topic::DeleteTopicProcess;
pub use schema_registration::SchemaRegistrationProcess;
pub use service_account::ServiceAccountProcess;

use crate::services::{AccountService, SchemaService, TopicService, VaultService};
use async_trait::async_trait;
use confluent_gateway_domain::{
    ConfluentApi, Database, DomainError, PersistenceError, SecretStore, UnitOfWork,
};
use saga_engine_core::TransactionalOutbox;
use saga_engine_core::step::{Perform, Step, Steps};
use std::sync::Arc;
use tracing::debug;

/// Step sequence of a saga over state `S`.
pub type SagaSteps<S> = Steps<SagaContext<S>, DomainError>;

/// Collaborators shared by all sagas.
#[derive(Clone)]
pub struct SagaServices {
    pub account: AccountService,
    pub vault: VaultService,
    pub topic: TopicService,
    pub schema: SchemaService,
    pub outbox: Arc<TransactionalOutbox>,
}

impl SagaServices {
    pub fn new(
        confluent: Arc<dyn ConfluentApi>,
        secrets: Arc<dyn SecretStore>,
        outbox: Arc<TransactionalOutbox>,
    ) -> Self {
        Self {
            account: AccountService::new(confluent.clone()),
            vault: VaultService::new(secrets),
            topic: TopicService::new(confluent.clone()),
            schema: SchemaService::new(confluent),
            outbox,
        }
    }
}

/// Saga progress that is written back after every attempt.
#[async_trait]
pub trait SagaState: Clone + Send + Sync + 'static {
    async fn save(&self, uow: &mut dyn UnitOfWork) -> Result<(), PersistenceError>;
}

/// Per-attempt context: a copy of the saga state, the attempt's unit of work
/// and the shared services.
pub struct SagaContext<S> {
    pub state: S,
    pub uow: Box<dyn UnitOfWork>,
    pub services: SagaServices,
}

impl<S> SagaContext<S> {
    pub fn new(state: S, uow: Box<dyn UnitOfWork>, services: SagaServices) -> Self {
        Self {
            state,
            uow,
            services,
        }
    }
}

/// Runs each attempt in its own transaction.
pub struct SagaPerformer<S> {
    database: Arc<dyn Database>,
    services: SagaServices,
    state: S,
}

impl<S: SagaState> SagaPerformer<S> {
    pub fn new(database: Arc<dyn Database>, services: SagaServices, state: S) -> Self {
        Self {
            database,
            services,
            state,
        }
    }

    /// State as of the last committed attempt.
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

#[async_trait]
impl<S: SagaState> Perform<SagaContext<S>, DomainError> for SagaPerformer<S> {
    async fn perform(
        &mut self,
        step: &Step<SagaContext<S>, DomainError>,
    ) -> Result<bool, DomainError> {
        let uow = self.database.begin().await?;
        let mut ctx = SagaContext::new(self.state.clone(), uow, self.services.clone());

        let done = step.invoke(&mut ctx).await?;

        let SagaContext { state, mut uow, .. } = ctx;
        state.save(&mut *uow).await?;
        uow.commit().await?;

        debug!(step = step.name(), done, "Step attempt committed");
        self.state = state;
        Ok(done)
    }
}
