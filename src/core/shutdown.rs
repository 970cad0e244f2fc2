//! Centralized graceful shutdown (spec.md §5).
//!
//! Sequence: stop accepting new connections, signal every session into
//! `CLOSING`, bound-drain every subscriber's outbound queue (deadline 5s),
//! close transports with code 1001, then release all state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::constants::{SHUTDOWN_DRAIN_TIMEOUT_SECS, SHUTDOWN_TASK_TIMEOUT_SECS};
use crate::kernel::Registry;

/// Coordinates graceful shutdown across the registry and background tasks.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    registry: Arc<Registry>,
}

impl Shutdown {
    pub fn new(registry: Arc<Registry>) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            handles: Arc::new(Mutex::new(Vec::new())),
            registry,
        }
    }

    /// Register a background task handle to be awaited during shutdown.
    pub async fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().await.push(handle);
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Future that resolves once shutdown has been triggered; used with
    /// `axum::serve(..).with_graceful_shutdown(..)`.
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.rx.clone();
        async move {
            let _ = rx.wait_for(|&v| v).await;
        }
    }

    /// Trigger shutdown and drive the sequence described in spec.md §5.
    pub async fn shutdown(&self) {
        tracing::debug!("Initiating graceful shutdown");
        self.trigger();

        let handles = std::mem::take(&mut *self.handles.lock().await);
        let task_count = handles.len();
        tracing::debug!(count = task_count, "Waiting for background tasks");

        let task_timeout = Duration::from_secs(SHUTDOWN_TASK_TIMEOUT_SECS);
        if tokio::time::timeout(task_timeout, futures::future::join_all(handles))
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_secs = SHUTDOWN_TASK_TIMEOUT_SECS,
                "Timeout waiting for background tasks"
            );
        }

        let drain_timeout = Duration::from_secs(SHUTDOWN_DRAIN_TIMEOUT_SECS);
        tracing::debug!(deadline_secs = SHUTDOWN_DRAIN_TIMEOUT_SECS, "Draining subscriber queues");
        if tokio::time::timeout(drain_timeout, self.registry.close_all_sessions())
            .await
            .is_err()
        {
            tracing::warn!("Drain deadline reached; closing remaining transports");
        }

        tracing::debug!("Shutdown complete");
    }

    /// Install OS signal handlers and auto-trigger on Ctrl+C/SIGTERM.
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");
            };

            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to install SIGTERM handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::debug!("Received Ctrl+C, shutting down"),
                _ = terminate => tracing::debug!("Received SIGTERM, shutting down"),
            }

            service.trigger();
        });
    }
}
