//! # Relay
//!
//! Background publishing of staged outbox entries.

pub mod outbox_relay;

pub use outbox_relay::{
    DefaultOutboxRelay, OutboxPublisher, OutboxRelay, OutboxRelayConfig, OutboxRelayMetrics,
    ProcessResult, RelayError,
};
