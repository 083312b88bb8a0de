//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, keyed by connection_id)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (text or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Connection ID flows through every handler log line
//! - Metrics are cheap no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
