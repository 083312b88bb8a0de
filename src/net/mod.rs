//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limit)
//!     → connection.rs (connection ID, active-count guard)
//!     → server.rs (spawn SessionHandler into the task group)
//!
//! Shutdown:
//!     stop accepting → drain task group → run() returns
//! ```
//!
//! # Design Decisions
//! - Bounded accept via semaphore prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Accept errors are transient; bind errors are fatal

pub mod connection;
pub mod listener;
pub mod server;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
pub use server::{BankServer, ServerError};
