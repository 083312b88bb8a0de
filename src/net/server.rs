//! Bank server: accept loop, handler supervision, drain.
//!
//! # Responsibilities
//! - Accept connections until shutdown
//! - Spawn one SessionHandler per connection into the task group
//! - Retry transient accept failures with backoff
//! - Run the periodic snapshot reporter
//! - Drain every handler before returning

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::config::{BankConfig, ConfigError};
use crate::lifecycle::task_group::log_failure;
use crate::lifecycle::{ShutdownListener, SnapshotReporter, TaskGroup};
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};
use crate::observability::metrics;
use crate::resilience::calculate_backoff;
use crate::session::SessionHandler;
use crate::store::AccountStore;

/// Fatal server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// TCP front end over a shared account store.
pub struct BankServer {
    config: BankConfig,
    store: Arc<AccountStore>,
    tracker: ConnectionTracker,
}

impl BankServer {
    /// Create a server with an empty store.
    pub fn new(config: BankConfig) -> Self {
        Self::with_store(config, Arc::new(AccountStore::new()))
    }

    /// Create a server over an existing store.
    pub fn with_store(config: BankConfig, store: Arc<AccountStore>) -> Self {
        Self {
            config,
            store,
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn store(&self) -> Arc<AccountStore> {
        Arc::clone(&self.store)
    }

    /// Handle on the active-connection counter.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Run until shutdown, then drain every connection.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownListener) -> Result<(), ServerError> {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(address = %addr, "Bank server accepting connections"),
            Err(e) => tracing::warn!(error = %e, "Bank server accepting connections on unknown address"),
        }

        let reporter = SnapshotReporter::new(self.store(), self.config.snapshot.clone());
        let reporter_task = tokio::spawn(reporter.run(shutdown.clone()));

        let mut handlers = TaskGroup::new();
        let mut accept_failures = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown observed, no longer accepting connections");
                    break;
                }
                Some(finished) = handlers.join_next() => log_failure(finished),
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        accept_failures = 0;
                        self.spawn_handler(&mut handlers, stream, peer, permit, shutdown.clone());
                    }
                    Err(ListenerError::Accept(e)) => {
                        accept_failures = accept_failures.saturating_add(1);
                        metrics::record_accept_error();
                        let delay = calculate_backoff(
                            accept_failures,
                            self.config.listener.accept_backoff_base_ms,
                            self.config.listener.accept_backoff_max_ms,
                        );
                        tracing::warn!(
                            error = %e,
                            attempt = accept_failures,
                            retry_in_ms = delay.as_millis() as u64,
                            "Accept failed, retrying"
                        );
                        if !pause_unless_shutdown(delay, &mut shutdown).await {
                            tracing::info!("Shutdown observed during accept backoff");
                            break;
                        }
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }

        drop(listener);

        if handlers.is_empty() {
            tracing::info!("No active connections, shutting down immediately");
        } else {
            tracing::info!(
                pending = handlers.len(),
                active = self.tracker.active_count(),
                "Draining active connections"
            );
        }

        let report = handlers.drain(self.config.shutdown.drain_timeout()).await;
        if report.aborted > 0 {
            tracing::warn!(
                completed = report.completed,
                aborted = report.aborted,
                "Drain deadline passed, aborted remaining connections"
            );
        }

        if let Err(e) = reporter_task.await {
            log_failure(Err(e));
        }

        tracing::info!(accounts = self.store.len(), "Bank server stopped");
        Ok(())
    }

    fn spawn_handler(
        &self,
        handlers: &mut TaskGroup,
        stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
        shutdown: ShutdownListener,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let guard = self.tracker.track();
        let id = guard.id();
        tracing::info!(
            connection_id = %id,
            peer_addr = %peer,
            active = self.tracker.active_count(),
            "Connection opened"
        );

        let handler = SessionHandler::new(id, self.store(), shutdown, &self.config.session);
        handlers.spawn(async move {
            let _permit = permit;
            let _guard = guard;
            if let Err(e) = handler.run(stream).await {
                tracing::warn!(connection_id = %id, peer_addr = %peer, error = %e, "Connection failed");
            }
        });
    }
}

/// Sleep for `delay`. Returns `false` as soon as shutdown is triggered.
async fn pause_unless_shutdown(delay: Duration, shutdown: &mut ShutdownListener) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.recv() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
