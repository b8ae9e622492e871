//! Inbound consumer loop.
//!
//! Messages are handled one at a time. The offset is committed after the
//! handler succeeds, or after a poison message is skipped. A handler failure
//! stops the loop without committing, so the message is redelivered after a
//! restart or rebalance.

use confluent_gateway_application::{Dispatched, MessageDispatcher};
use confluent_gateway_infrastructure::messaging::MessageConsumer;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub async fn run_consumer(
    consumer: &MessageConsumer,
    dispatcher: &MessageDispatcher,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    loop {
        let message = tokio::select! {
            _ = shutdown.recv() => {
                info!("Consumer stopping");
                return Ok(());
            }
            received = consumer.recv() => received?,
        };

        match dispatcher.dispatch(&message.payload).await {
            Ok(Dispatched::Handled { message_id }) => {
                debug!(
                    %message_id,
                    topic = %message.topic,
                    offset = message.offset,
                    "Message handled"
                );
            }
            Ok(Dispatched::Skipped { .. }) => {}
            Err(e) if e.is_poison() => {
                error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Skipping message that can never be handled"
                );
            }
            Err(e) => {
                error!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Message handling failed, stopping consumer"
                );
                return Err(e.into());
            }
        }

        consumer.commit(&message)?;
    }
}
