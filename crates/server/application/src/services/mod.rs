//! Stateless services used by the saga steps.
//!
//! Services hold only their collaborators. Persistent effects go through the
//! unit of work passed to each call, so they commit with the attempt.

pub mod account;
pub mod schema;
pub mod topic;
pub mod vault;

pub use account::AccountService;
pub use schema::SchemaService;
pub use topic::TopicService;
pub use vault::VaultService;
