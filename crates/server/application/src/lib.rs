// Confluent Gateway - Application Layer
// - saga: the four provisioning sagas and their per-attempt context
// - services: stateless collaborators used by the saga steps
// - handlers / dispatcher: inbound message routing

pub mod dispatcher;
pub mod handlers;
pub mod saga;
pub mod services;

pub use dispatcher::{DispatchError, Dispatched, MessageDispatcher, gateway_dispatcher};
pub use handlers::MessageHandler;
pub use saga::{
    CreateTopicProcess, DeleteTopicProcess, SagaServices, SchemaRegistrationProcess,
    ServiceAccountProcess,
};
