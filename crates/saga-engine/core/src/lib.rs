//! # saga-engine-core
//!
//! Building blocks for resumable, message-driven sagas with no infrastructure
//! dependencies.
//!
//! ## Modules
//!
//! - [`step`]: [`Steps`] pipelines of named, idempotent actions driven by a
//!   caller-supplied [`Perform`] implementation
//! - [`outbox`]: [`TransactionalOutbox`] staging of outgoing messages inside
//!   the caller's transaction
//! - [`relay`]: [`DefaultOutboxRelay`] publishing staged entries in order
//!
//! ## Usage
//!
//! ```rust
//! use saga_engine_core::step::StepsBuilder;
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: u32,
//! }
//!
//! let steps = StepsBuilder::<Counter, std::io::Error>::new()
//!     .step("increment", |ctx| {
//!         Box::pin(async move {
//!             ctx.value += 1;
//!             Ok(())
//!         })
//!     })
//!     .until(|ctx| ctx.value >= 3)
//!     .build();
//!
//! assert_eq!(steps.names().collect::<Vec<_>>(), vec!["increment"]);
//! ```

pub mod outbox;
pub mod relay;
pub mod step;

pub use outbox::{
    Envelope, OutboxEntry, OutboxError, OutboxRepository, OutboxWriter, OutgoingMessage,
    TransactionalOutbox,
};
pub use relay::{
    DefaultOutboxRelay, OutboxPublisher, OutboxRelay, OutboxRelayConfig, OutboxRelayMetrics,
    ProcessResult, RelayError,
};
pub use step::{Perform, Step, StepFuture, Steps, StepsBuilder};
