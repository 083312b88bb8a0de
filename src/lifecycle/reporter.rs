//! Periodic account snapshots.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::SnapshotConfig;
use crate::observability::metrics;
use crate::store::{AccountStore, Snapshot};

use super::ShutdownListener;

/// Dumps the store on a fixed interval until shutdown.
pub struct SnapshotReporter {
    store: Arc<AccountStore>,
    config: SnapshotConfig,
}

impl SnapshotReporter {
    pub fn new(store: Arc<AccountStore>, config: SnapshotConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(self, mut shutdown: ShutdownListener) {
        if !self.config.enabled {
            tracing::info!("Periodic snapshots disabled");
            return;
        }

        let period = Duration::from_secs(self.config.interval_secs);
        tracing::info!(interval_secs = self.config.interval_secs, "Snapshot reporter starting");

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Snapshot reporter received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Take and log one snapshot.
    pub fn report(&self) -> Snapshot {
        let snapshot = self.store.snapshot();
        metrics::record_snapshot(snapshot.len());
        tracing::info!(
            accounts = snapshot.len(),
            sessions = snapshot.sessions_active(),
            "Account snapshot\n{}",
            snapshot
        );
        snapshot
    }
}
