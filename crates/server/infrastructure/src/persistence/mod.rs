// Persistence Layer - unit of work, outbox and cluster catalog per backend

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDatabase;
pub use postgres::{PgClusterCatalog, PgOutboxRepository, PgUnitOfWork, PostgresDatabase};
