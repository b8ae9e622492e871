//! Secret store adapters

pub mod ssm;

pub use ssm::SsmSecretStore;
