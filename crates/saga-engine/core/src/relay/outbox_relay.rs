//! # Outbox Relay
//!
//! Background processing of staged outbox entries:
//! 1. Polls the outbox for unprocessed entries, oldest first
//! 2. Publishes each entry with its partition key
//! 3. Marks the entry processed
//!
//! A publish failure ends the batch so later entries never overtake an
//! earlier one. Delivery is at-least-once: an entry published but not yet
//! marked is published again on the next poll.

use crate::outbox::{OutboxEntry, OutboxRepository};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

/// Trait for the outbox relay that processes entries in the background.
#[async_trait]
pub trait OutboxRelay: Send + Sync {
    /// Start the relay processing loop.
    async fn start(&self, shutdown: broadcast::Receiver<()>) -> Result<(), RelayError>;

    /// Process a single batch of entries.
    async fn process_batch(&self, batch_size: usize) -> Result<ProcessResult, RelayError>;

    /// Get current metrics.
    fn metrics(&self) -> OutboxRelayMetrics;
}

/// Configuration for the outbox relay.
#[derive(Debug, Clone)]
pub struct OutboxRelayConfig {
    /// Polling interval when no entries are pending.
    pub poll_interval: std::time::Duration,
    /// Maximum entries to process in a batch.
    pub batch_size: usize,
}

impl Default for OutboxRelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: std::time::Duration::from_millis(1000),
            batch_size: 100,
        }
    }
}

/// Result of processing a batch of entries.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Number of entries fetched.
    pub fetched: usize,
    /// Number of entries published and marked processed.
    pub published: usize,
    /// Whether the batch stopped early on a publish failure.
    pub interrupted: bool,
    /// Duration of the batch processing.
    pub duration: std::time::Duration,
}

impl ProcessResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            fetched: 0,
            published: 0,
            interrupted: false,
            duration: std::time::Duration::ZERO,
        }
    }
}

/// Metrics for the outbox relay.
#[derive(Debug, Default)]
pub struct OutboxRelayMetrics {
    /// Total entries published since start.
    pub total_published: AtomicU64,
    /// Total publish failures since start.
    pub total_failed: AtomicU64,
    /// Duration of the last batch in milliseconds.
    pub last_batch_duration_ms: AtomicU64,
}

impl Clone for OutboxRelayMetrics {
    fn clone(&self) -> Self {
        Self {
            total_published: AtomicU64::new(self.total_published.load(Ordering::SeqCst)),
            total_failed: AtomicU64::new(self.total_failed.load(Ordering::SeqCst)),
            last_batch_duration_ms: AtomicU64::new(
                self.last_batch_duration_ms.load(Ordering::SeqCst),
            ),
        }
    }
}

impl OutboxRelayMetrics {
    pub fn increment_published(&self, count: usize) {
        self.total_published
            .fetch_add(count as u64, Ordering::SeqCst);
    }

    pub fn increment_failed(&self) {
        self.total_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_last_batch_duration(&self, ms: u64) {
        self.last_batch_duration_ms.store(ms, Ordering::SeqCst);
    }
}

/// Errors that can occur in the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Publisher error: {0}")]
    Publisher(String),
}

/// Publisher trait for sending entries to the message broker.
#[async_trait]
pub trait OutboxPublisher: Send + Sync {
    /// Publish a payload to `topic` with partition `key`.
    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), String>;
}

/// Default implementation of OutboxRelay.
pub struct DefaultOutboxRelay<R, P>
where
    R: OutboxRepository + 'static,
    P: OutboxPublisher + 'static,
{
    repository: Arc<R>,
    publisher: Arc<P>,
    config: OutboxRelayConfig,
    metrics: Arc<OutboxRelayMetrics>,
}

impl<R, P> DefaultOutboxRelay<R, P>
where
    R: OutboxRepository + 'static,
    P: OutboxPublisher + 'static,
{
    /// Create a new relay.
    pub fn new(repository: Arc<R>, publisher: Arc<P>, config: OutboxRelayConfig) -> Self {
        Self {
            repository,
            publisher,
            config,
            metrics: Arc::new(OutboxRelayMetrics::default()),
        }
    }

    async fn relay_entry(&self, entry: &OutboxEntry) -> Result<(), RelayError> {
        self.publisher
            .publish(&entry.topic, &entry.partition_key, entry.payload.as_bytes())
            .await
            .map_err(RelayError::Publisher)?;

        self.repository
            .mark_processed(entry.id)
            .await
            .map_err(|e| RelayError::Repository(e.to_string()))
    }
}

#[async_trait]
impl<R, P> OutboxRelay for DefaultOutboxRelay<R, P>
where
    R: OutboxRepository + 'static,
    P: OutboxPublisher + 'static,
{
    async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), RelayError> {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "Starting outbox relay"
        );

        loop {
            let result = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Outbox relay shutting down");
                    return Ok(());
                }
                result = self.process_batch(self.config.batch_size) => result,
            };

            // A full, uninterrupted batch means more may be waiting.
            let drained = match result {
                Ok(result) => result.interrupted || result.fetched < self.config.batch_size,
                Err(e) => {
                    tracing::error!(error = %e, "Outbox batch processing error");
                    true
                }
            };

            if drained {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::info!("Outbox relay shutting down");
                        return Ok(());
                    }
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }
    }

    async fn process_batch(&self, batch_size: usize) -> Result<ProcessResult, RelayError> {
        let start = std::time::Instant::now();

        let entries = self
            .repository
            .get_unprocessed(batch_size)
            .await
            .map_err(|e| RelayError::Repository(e.to_string()))?;

        if entries.is_empty() {
            return Ok(ProcessResult::empty());
        }

        let mut published = 0;
        let mut interrupted = false;

        for entry in &entries {
            match self.relay_entry(entry).await {
                Ok(()) => published += 1,
                Err(e) => {
                    tracing::warn!(
                        entry_id = %entry.id,
                        topic = %entry.topic,
                        error = %e,
                        "Failed to relay outbox entry, retrying on next poll"
                    );
                    self.metrics.increment_failed();
                    interrupted = true;
                    break;
                }
            }
        }

        let duration = start.elapsed();
        self.metrics.increment_published(published);
        self.metrics
            .set_last_batch_duration(duration.as_millis() as u64);

        tracing::debug!(fetched = entries.len(), published, "Outbox batch relayed");

        Ok(ProcessResult {
            fetched: entries.len(),
            published,
            interrupted,
            duration,
        })
    }

    fn metrics(&self) -> OutboxRelayMetrics {
        (*self.metrics).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Debug, Default)]
    struct MemoryRepository {
        entries: Mutex<Vec<OutboxEntry>>,
    }

    impl MemoryRepository {
        fn with_entries(topics: &[&str]) -> Self {
            let entries = topics
                .iter()
                .map(|topic| OutboxEntry {
                    id: Uuid::new_v4(),
                    topic: topic.to_string(),
                    partition_key: "key".to_string(),
                    payload: "{}".to_string(),
                    occurred_at: Utc::now(),
                    processed_at: None,
                })
                .collect();
            Self {
                entries: Mutex::new(entries),
            }
        }
    }

    #[async_trait]
    impl OutboxRepository for MemoryRepository {
        type Error = std::io::Error;

        async fn get_unprocessed(&self, batch_size: usize) -> Result<Vec<OutboxEntry>, Self::Error> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| !e.is_processed())
                .take(batch_size)
                .cloned()
                .collect())
        }

        async fn mark_processed(&self, id: Uuid) -> Result<(), Self::Error> {
            for entry in self.entries.lock().unwrap().iter_mut() {
                if entry.id == id {
                    entry.processed_at = Some(Utc::now());
                }
            }
            Ok(())
        }

        async fn unprocessed_count(&self) -> Result<u64, Self::Error> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| !e.is_processed())
                .count() as u64)
        }
    }

    #[derive(Debug, Default)]
    struct MockPublisher {
        published: Mutex<Vec<String>>,
        fail_on_topic: Option<String>,
    }

    #[async_trait]
    impl OutboxPublisher for MockPublisher {
        async fn publish(&self, topic: &str, _key: &str, _payload: &[u8]) -> Result<(), String> {
            if self.fail_on_topic.as_deref() == Some(topic) {
                return Err("broker unavailable".to_string());
            }
            self.published.lock().unwrap().push(topic.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_process_batch_publishes_in_order_and_marks_processed() {
        let repository = Arc::new(MemoryRepository::with_entries(&["a", "b", "c"]));
        let publisher = Arc::new(MockPublisher::default());
        let relay = DefaultOutboxRelay::new(
            repository.clone(),
            publisher.clone(),
            OutboxRelayConfig::default(),
        );

        let result = relay.process_batch(10).await.unwrap();

        assert_eq!(result.fetched, 3);
        assert_eq!(result.published, 3);
        assert!(!result.interrupted);
        assert_eq!(*publisher.published.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(repository.unprocessed_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_stops_batch_to_keep_order() {
        let repository = Arc::new(MemoryRepository::with_entries(&["a", "b", "c"]));
        let publisher = Arc::new(MockPublisher {
            fail_on_topic: Some("b".to_string()),
            ..Default::default()
        });
        let relay = DefaultOutboxRelay::new(
            repository.clone(),
            publisher.clone(),
            OutboxRelayConfig::default(),
        );

        let result = relay.process_batch(10).await.unwrap();

        assert_eq!(result.published, 1);
        assert!(result.interrupted);
        assert_eq!(*publisher.published.lock().unwrap(), vec!["a"]);
        assert_eq!(repository.unprocessed_count().await.unwrap(), 2);
        assert_eq!(relay.metrics().total_failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_stops_on_shutdown() {
        let repository = Arc::new(MemoryRepository::with_entries(&["a"]));
        let publisher = Arc::new(MockPublisher::default());
        let relay = DefaultOutboxRelay::new(
            repository.clone(),
            publisher,
            OutboxRelayConfig {
                poll_interval: std::time::Duration::from_millis(10),
                batch_size: 10,
            },
        );

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move { relay.start(rx).await });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        handle.await.unwrap().unwrap();
        assert_eq!(repository.unprocessed_count().await.unwrap(), 0);
    }

    #[test]
    fn test_relay_config_defaults() {
        let config = OutboxRelayConfig::default();
        assert_eq!(config.poll_interval, std::time::Duration::from_millis(1000));
        assert_eq!(config.batch_size, 100);
    }
}
