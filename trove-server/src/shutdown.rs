//! Structured shutdown coordination.
//!
//! A single coordinator replaces scattered signal handlers: on a
//! termination request the server stops accepting connections, drains
//! in-flight requests within a grace period, then tears down the lock
//! registry.

use tokio::sync::watch;
use tracing::info;

/// Receives the shutdown request, however it originates.
pub struct ShutdownCoordinator {
    rx: watch::Receiver<bool>,
}

/// Hand-driven trigger, for tests and embedding.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl ShutdownCoordinator {
    /// Coordinator driven by SIGINT/SIGTERM. Must be called inside a tokio
    /// runtime.
    pub fn from_signals() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("termination signal received");
            let _ = tx.send(true);
        });
        Self { rx }
    }

    /// Coordinator triggered through the returned handle.
    pub fn manual() -> (ShutdownHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (ShutdownHandle { tx }, Self { rx })
    }

    /// Completes once shutdown has been requested. A request that arrived
    /// before the first call is still observed; a closed channel counts as
    /// a request.
    pub async fn requested(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut interrupt =
            signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        tokio::select! {
            _ = terminate.recv() => {}
            _ = interrupt.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_manual_trigger() {
        let (handle, mut coordinator) = ShutdownCoordinator::manual();
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(1), coordinator.requested())
            .await
            .expect("shutdown not observed");
    }

    #[tokio::test]
    async fn test_request_before_wait_is_observed() {
        let (handle, mut coordinator) = ShutdownCoordinator::manual();
        handle.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::timeout(Duration::from_secs(1), coordinator.requested())
            .await
            .expect("earlier shutdown not observed");
    }
}
