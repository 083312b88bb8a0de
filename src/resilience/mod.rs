//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! accept() fails (fd exhaustion, aborted handshake, ...)
//!     → backoff.rs (exponential delay with jitter)
//!     → accept loop retries; counter resets on success
//! ```

pub mod backoff;

pub use backoff::calculate_backoff;
