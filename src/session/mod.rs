//! Per-connection session subsystem.
//!
//! # Data Flow
//! ```text
//! request frame
//!     → handler.rs (socket loop, shutdown + idle timeout)
//!     → Command::parse
//!     → state.rs (Idle/Active state machine over the store)
//!     → Response → response frame
//! ```
//!
//! # Design Decisions
//! - State machine is free of I/O so it can be exercised directly
//! - Dropping a session always releases its account binding
//! - Command, parse and encoding errors become responses; only I/O errors
//!   end a connection

pub mod handler;
pub mod state;

use thiserror::Error;

use crate::protocol::ParseError;
use crate::store::StoreError;

pub use handler::SessionHandler;
pub use state::{Outcome, Session, SessionState};

/// Why a command was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Command needs a bound account but the connection has none.
    #[error("Must be in active session")]
    SessionRequired,

    /// Command needs an unbound connection but one account is already bound.
    #[error("Must not be in active session")]
    SessionActive,

    #[error("Invalid command")]
    Parse(#[from] ParseError),

    /// The reply could not be encoded into a response frame.
    #[error("Response unavailable")]
    Unrenderable,
}

impl CommandError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Store(StoreError::AccountAlreadyExists) => "account_exists",
            CommandError::Store(StoreError::AccountNotFound) => "account_not_found",
            CommandError::Store(StoreError::AlreadyInSession) => "already_in_session",
            CommandError::Store(StoreError::NotInSession) => "not_in_session",
            CommandError::Store(StoreError::InsufficientFunds) => "insufficient_funds",
            CommandError::Store(StoreError::BalanceLimitExceeded) => "balance_limit",
            CommandError::SessionRequired => "session_required",
            CommandError::SessionActive => "session_active",
            CommandError::Parse(_) => "invalid_command",
            CommandError::Unrenderable => "unrenderable",
        }
    }
}
