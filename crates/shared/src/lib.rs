pub mod config;
pub mod event_topics;
pub mod ids;

pub use event_topics::*;
pub use ids::*;
