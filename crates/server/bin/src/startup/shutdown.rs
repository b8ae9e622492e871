//! Graceful shutdown
//!
//! One broadcast channel fans the stop signal out to the consumer loop and
//! the outbox relay. It fires on SIGINT, SIGTERM, or when either task ends
//! on its own.

use std::fmt;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    SigTerm,
    SigInt,
    /// A background task stopped
    TaskExited(String),
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::SigTerm => write!(f, "SIGTERM"),
            ShutdownReason::SigInt => write!(f, "SIGINT (Ctrl+C)"),
            ShutdownReason::TaskExited(task) => write!(f, "{} exited", task),
        }
    }
}

#[derive(Clone)]
pub struct GracefulShutdown {
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl GracefulShutdown {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { shutdown_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Notifies every subscriber. Later calls are no-ops for receivers that
    /// already saw the signal.
    pub fn shutdown(&self, reason: ShutdownReason) {
        info!(%reason, "Shutdown requested");
        // No receivers left means everything already stopped.
        let _ = self.shutdown_tx.send(());
    }
}

/// Triggers `coordinator` on the first SIGINT or SIGTERM.
pub fn start_signal_handler(coordinator: &GracefulShutdown) {
    let coordinator = coordinator.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to register ctrl-c handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        let term = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to register SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => coordinator.shutdown(ShutdownReason::SigInt),
            _ = term => coordinator.shutdown(ShutdownReason::SigTerm),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_reaches_every_subscriber() {
        let shutdown = GracefulShutdown::new();
        let mut consumer = shutdown.subscribe();
        let mut relay = shutdown.subscribe();

        shutdown.shutdown(ShutdownReason::TaskExited("relay".to_string()));

        assert!(consumer.recv().await.is_ok());
        assert!(relay.recv().await.is_ok());
    }

    #[test]
    fn test_shutdown_without_subscribers_does_not_panic() {
        let shutdown = GracefulShutdown::new();
        shutdown.shutdown(ShutdownReason::SigInt);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ShutdownReason::SigTerm.to_string(), "SIGTERM");
        assert_eq!(
            ShutdownReason::TaskExited("consumer".to_string()).to_string(),
            "consumer exited"
        );
    }
}
