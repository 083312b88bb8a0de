//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (ctrl-c) and, on unix, SIGTERM
//! - First signal triggers graceful shutdown
//! - Second signal forces the process to exit

use std::sync::Arc;
use tokio::task::JoinHandle;

use super::Shutdown;

/// Wait for the next termination signal and return its name.
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
    }
}

/// Spawn the task that turns signals into shutdown.
pub fn spawn_handler(shutdown: Arc<Shutdown>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => {
                tracing::info!(signal = name, "Shutdown signal received, draining connections");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                return;
            }
        }

        if let Ok(name) = wait_for_signal().await {
            tracing::warn!(signal = name, "Second signal received, forcing exit");
            std::process::exit(1);
        }
    })
}
