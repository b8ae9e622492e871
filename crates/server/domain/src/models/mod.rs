//! Domain model

pub mod acl;
pub mod cluster;
pub mod process;
pub mod service_account;
pub mod topic;

pub use acl::*;
pub use cluster::*;
pub use process::*;
pub use service_account::*;
pub use topic::*;
