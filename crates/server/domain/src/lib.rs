// Confluent Gateway - Domain Layer
// - models: process state, service accounts, cluster access, topics
// - messages: inbound requests and outgoing events
// - ports: platform, secret store, persistence and cluster catalog
// - error: domain and collaborator errors

pub mod error;
pub mod messages;
pub mod models;
pub mod ports;

pub use error::*;
pub use messages::*;
pub use models::*;
pub use ports::*;

pub use confluent_gateway_shared::{
    CapabilityId, ClusterId, MessageContractId, ServiceAccountId, TopicId, UserAccountId,
};
