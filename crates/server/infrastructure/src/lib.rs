// Confluent Gateway - Infrastructure Layer
// - persistence: PostgreSQL and in-memory unit of work, outbox and cluster catalog
// - confluent: Confluent Cloud REST client
// - vault: AWS SSM parameter store for API keys
// - messaging: Kafka consumer and outbox publisher

pub mod confluent;
pub mod messaging;
pub mod persistence;
pub mod vault;

pub use confluent::ConfluentClient;
pub use messaging::{KafkaOutboxPublisher, create_consumer};
pub use persistence::memory::InMemoryDatabase;
pub use persistence::postgres::{PgClusterCatalog, PgOutboxRepository, PostgresDatabase};
pub use vault::SsmSecretStore;
