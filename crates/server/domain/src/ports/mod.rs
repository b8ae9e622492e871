//! Ports implemented by the infrastructure layer

pub mod catalog;
pub mod confluent;
pub mod persistence;
pub mod secrets;

pub use catalog::ClusterCatalog;
pub use confluent::{ConfluentApi, InternalUser};
pub use persistence::{Database, UnitOfWork};
pub use secrets::{ApiKeyDestination, SecretStore};
