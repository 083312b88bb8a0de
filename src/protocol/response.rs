//! Response rendering.

use std::fmt;

use crate::session::CommandError;

/// Sent to every live connection when the server shuts down.
pub const SHUTDOWN_NOTICE: &str = "Server has been shutdown";

/// A reply to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    AccountCreated,
    SessionStarted,
    DepositMade,
    WithdrawalMade,
    SessionEnded,
    Balance(f64),
    Error(CommandError),
    Shutdown,
}

impl Response {
    /// Short outcome label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Response::Error(err) => err.kind(),
            Response::Shutdown => "shutdown",
            _ => "success",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::AccountCreated => f.write_str("SUCCESS: New account created"),
            Response::SessionStarted => f.write_str("SUCCESS: New session started"),
            Response::DepositMade => f.write_str("SUCCESS: Deposit made"),
            Response::WithdrawalMade => f.write_str("SUCCESS: Withdrawl made"),
            Response::SessionEnded => f.write_str("SUCCESS: Session ended"),
            Response::Balance(balance) => write!(f, "Your current balance is: {:.6}", balance),
            Response::Error(err) => write!(f, "ERROR: {}", err),
            Response::Shutdown => f.write_str(SHUTDOWN_NOTICE),
        }
    }
}

impl From<CommandError> for Response {
    fn from(err: CommandError) -> Self {
        Response::Error(err)
    }
}
