pub mod events;
pub mod inbound;

pub use events::*;
pub use inbound::*;
