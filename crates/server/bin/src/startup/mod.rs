//! Startup module - wires the gateway and runs it until shutdown.
//!
//! 1. Connect to PostgreSQL and apply the schema
//! 2. Build the platform client, secret store and outbox registrations
//! 3. Spawn the outbox relay
//! 4. Consume inbound requests until a signal or a fatal handler error

pub mod consumer;
pub mod shutdown;

use confluent_gateway_application::{SagaServices, gateway_dispatcher};
use confluent_gateway_domain::register_outgoing_messages;
use confluent_gateway_infrastructure::{
    ConfluentClient, KafkaOutboxPublisher, PgClusterCatalog, PgOutboxRepository,
    PostgresDatabase, SsmSecretStore, create_consumer,
};
use confluent_gateway_shared::config::GatewayConfig;
use confluent_gateway_shared::event_topics::selfservice;
use saga_engine_core::{DefaultOutboxRelay, OutboxRelay, OutboxRelayConfig, TransactionalOutbox};
use shutdown::{GracefulShutdown, ShutdownReason, start_signal_handler};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Current application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the gateway until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    info!(version = APP_VERSION, "Starting Confluent Gateway");

    // Step 1: Database
    let database = PostgresDatabase::connect(&config.database).await?;
    database.migrate().await?;
    let pool = database.pool().clone();
    info!("✓ Database connected and migrated");

    // Step 2: Collaborators
    let catalog = Arc::new(PgClusterCatalog::new(pool.clone()));
    let confluent = Arc::new(ConfluentClient::new(&config.confluent, catalog)?);
    let secrets = Arc::new(SsmSecretStore::from_config(&config.vault).await);

    let mut outbox = TransactionalOutbox::new();
    register_outgoing_messages(&mut outbox)?;

    let services = SagaServices::new(confluent, secrets, Arc::new(outbox));
    let dispatcher = gateway_dispatcher(Arc::new(database), services)?;
    info!("✓ Sagas wired");

    let shutdown = GracefulShutdown::new();
    start_signal_handler(&shutdown);

    // Step 3: Outbox relay
    let publisher = Arc::new(KafkaOutboxPublisher::new(&config.kafka)?);
    let relay = DefaultOutboxRelay::new(
        Arc::new(PgOutboxRepository::new(pool)),
        publisher,
        OutboxRelayConfig {
            poll_interval: Duration::from_millis(config.relay.poll_interval_ms),
            batch_size: config.relay.batch_size,
        },
    );
    let relay_task = spawn_relay(relay, &shutdown);
    info!("✓ Outbox relay started");

    // Step 4: Consumer
    let consumer = create_consumer(&config.kafka, &selfservice::ALL)?;
    info!("✓ Consuming inbound requests");
    let result = consumer::run_consumer(&consumer, &dispatcher, shutdown.subscribe()).await;

    shutdown.shutdown(ShutdownReason::TaskExited("consumer".to_string()));
    if let Err(e) = relay_task.await {
        error!(error = %e, "Outbox relay task panicked");
    }

    info!("Confluent Gateway stopped");
    result
}

fn spawn_relay<R>(relay: R, shutdown: &GracefulShutdown) -> JoinHandle<()>
where
    R: OutboxRelay + 'static,
{
    let receiver = shutdown.subscribe();
    let shutdown = shutdown.clone();

    tokio::spawn(async move {
        if let Err(e) = relay.start(receiver).await {
            error!(error = %e, "Outbox relay stopped");
        }
        shutdown.shutdown(ShutdownReason::TaskExited("outbox relay".to_string()));
    })
}
