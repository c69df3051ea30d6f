//! Graceful shutdown coordinator
//!
//! Hosts broadcast one signal to every listening task, drain what needs
//! draining (the enrichment pool, open subscriptions) within the grace
//! period, then mark the shutdown complete.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub enum ShutdownSignal {
    /// Finish in-flight work before exiting
    Graceful,
    /// Exit now, dropping queued work
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Stopped,
}

/// Fans one shutdown signal out to every subscribed task.
pub struct ShutdownCoordinator {
    state: Arc<RwLock<ShutdownState>>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            state: Arc::new(RwLock::new(ShutdownState::Running)),
            shutdown_tx,
            grace_period,
        }
    }

    /// How long the host should wait for drains before giving up.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.shutdown_tx.subscribe()
    }

    /// Broadcast a graceful shutdown and enter the draining state.
    /// Calling again while already draining is a no-op.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.write().await;
            if *state != ShutdownState::Running {
                warn!("shutdown already in progress");
                return;
            }
            *state = ShutdownState::Draining;
        }

        info!("shutting down, draining in-flight work");
        // Send fails only when nothing is listening, which is fine
        let _ = self.shutdown_tx.send(ShutdownSignal::Graceful);
    }

    /// Broadcast an immediate shutdown, skipping the draining state.
    pub async fn shutdown_immediately(&self) {
        warn!("immediate shutdown requested");

        {
            let mut state = self.state.write().await;
            *state = ShutdownState::Stopped;
        }

        let _ = self.shutdown_tx.send(ShutdownSignal::Immediate);
    }

    /// Mark the drain finished. Called by the host once its last
    /// component has exited.
    pub async fn complete(&self) {
        let mut state = self.state.write().await;
        *state = ShutdownState::Stopped;
        info!("shutdown complete");
    }

    pub async fn is_shutting_down(&self) -> bool {
        *self.state.read().await != ShutdownState::Running
    }

    pub async fn state(&self) -> ShutdownState {
        *self.state.read().await
    }

    /// Block until a shutdown signal arrives. A closed channel counts
    /// as a graceful request.
    pub async fn wait_for_shutdown(&self) -> ShutdownSignal {
        let mut rx = self.subscribe();
        rx.recv().await.unwrap_or(ShutdownSignal::Graceful)
    }
}

/// Install SIGTERM/SIGINT handlers that trigger a graceful shutdown.
#[cfg(unix)]
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                coordinator.shutdown().await;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
                coordinator.shutdown().await;
            }
        }
    });
}

/// Install a Ctrl+C handler that triggers a graceful shutdown (Windows).
#[cfg(windows)]
pub fn install_signal_handlers(coordinator: Arc<ShutdownCoordinator>) {
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C");
        coordinator.shutdown().await;
    });
}
