//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!     second signal  → forced exit
//!
//! Shutdown (shutdown.rs):
//!     trigger → every ShutdownListener wakes
//!             → accept loop stops, handlers send notice and close
//!
//! Drain (task_group.rs):
//!     accept loop stopped → await every handler task (optional deadline)
//!
//! Snapshots (reporter.rs):
//!     fixed interval → AccountStore::snapshot → log; stops on shutdown
//! ```
//!
//! # Design Decisions
//! - Shutdown is a watch channel, so late subscribers still observe it
//! - Handler tasks live in a JoinSet; nothing tracks raw handles by hand
//! - Drain has an optional deadline: stragglers are aborted after it

pub mod reporter;
pub mod shutdown;
pub mod signals;
pub mod task_group;

pub use reporter::SnapshotReporter;
pub use shutdown::{Shutdown, ShutdownListener};
pub use task_group::{DrainReport, TaskGroup};
