//! Session state machine.
//!
//! # States
//! - Idle: no account bound; only `create`, `serve` and `quit` are useful
//! - Active: one account bound; balance commands apply to it
//!
//! # State Transitions
//! ```text
//! Idle   → Active: serve <name> succeeds
//! Active → Idle:   end succeeds
//! any    → closed: quit, disconnect, idle timeout, shutdown
//! ```

use std::sync::Arc;

use crate::observability::metrics;
use crate::protocol::{Command, Response};
use crate::store::{AccountStore, StoreError};

use super::CommandError;

/// Binding between a connection and an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active { account: String },
}

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send this response and keep reading.
    Reply(Response),
    /// Close the connection without replying.
    Close,
}

/// Protocol state of one connection.
///
/// An active session is ended in the store when the `Session` is closed or
/// dropped, whichever happens first.
#[derive(Debug)]
pub struct Session {
    store: Arc<AccountStore>,
    state: SessionState,
}

impl Session {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self {
            store,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Name of the bound account, if any.
    pub fn account(&self) -> Option<&str> {
        match &self.state {
            SessionState::Active { account } => Some(account),
            SessionState::Idle => None,
        }
    }

    pub fn execute(&mut self, command: &Command) -> Outcome {
        let result = match command {
            Command::Quit => {
                self.close();
                return Outcome::Close;
            }
            Command::Create(name) => self
                .store
                .create(name)
                .map(|_| Response::AccountCreated)
                .map_err(CommandError::from),
            Command::Serve(name) => self.serve(name),
            Command::Deposit(amount) => self.with_account(|store, account| {
                store.deposit(account, *amount).map(|_| Response::DepositMade)
            }),
            Command::Withdraw(amount) => self.with_account(|store, account| {
                store.withdraw(account, *amount).map(|_| Response::WithdrawalMade)
            }),
            Command::Query => {
                self.with_account(|store, account| store.query(account).map(Response::Balance))
            }
            Command::End => self.end(),
        };

        Outcome::Reply(result.unwrap_or_else(Response::Error))
    }

    fn serve(&mut self, name: &str) -> Result<Response, CommandError> {
        if self.account().is_some() {
            return Err(CommandError::SessionActive);
        }
        self.store.start_session(name)?;
        metrics::record_session_started();
        self.state = SessionState::Active {
            account: name.to_string(),
        };
        Ok(Response::SessionStarted)
    }

    fn end(&mut self) -> Result<Response, CommandError> {
        let account = self.account().ok_or(CommandError::SessionRequired)?;
        self.store.end_session(account)?;
        metrics::record_session_ended();
        self.state = SessionState::Idle;
        Ok(Response::SessionEnded)
    }

    fn with_account<F>(&self, op: F) -> Result<Response, CommandError>
    where
        F: FnOnce(&AccountStore, &str) -> Result<Response, StoreError>,
    {
        let account = self.account().ok_or(CommandError::SessionRequired)?;
        op(self.store.as_ref(), account).map_err(CommandError::from)
    }

    /// End the active session, if any. Returns the released account name.
    pub fn close(&mut self) -> Option<String> {
        let SessionState::Active { account } = std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            return None;
        };

        match self.store.end_session(&account) {
            Ok(()) => metrics::record_session_ended(),
            Err(e) => tracing::warn!(account = %account, error = %e, "Failed to release session"),
        }
        Some(account)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(account) = self.close() {
            tracing::debug!(account = %account, "Session released on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(outcome: Outcome) -> String {
        match outcome {
            Outcome::Reply(response) => response.to_string(),
            Outcome::Close => "<closed>".to_string(),
        }
    }

    fn run(session: &mut Session, line: &str) -> String {
        reply(session.execute(&Command::parse(line).unwrap()))
    }

    #[test]
    fn full_account_lifecycle() {
        let store = Arc::new(AccountStore::new());
        let mut session = Session::new(Arc::clone(&store));

        assert_eq!(run(&mut session, "create alice"), "SUCCESS: New account created");
        assert_eq!(run(&mut session, "serve alice"), "SUCCESS: New session started");
        assert_eq!(run(&mut session, "deposit 100.0"), "SUCCESS: Deposit made");
        assert_eq!(run(&mut session, "query"), "Your current balance is: 100.000000");
        assert_eq!(run(&mut session, "withdraw 30.0"), "SUCCESS: Withdrawl made");
        assert_eq!(run(&mut session, "query"), "Your current balance is: 70.000000");
        assert_eq!(run(&mut session, "end"), "SUCCESS: Session ended");
        assert_eq!(run(&mut session, "quit"), "<closed>");

        let snapshot = store.snapshot();
        let alice = snapshot.get("alice").unwrap();
        assert_eq!(alice.balance, 70.0);
        assert!(!alice.in_session);
    }

    #[test]
    fn balance_commands_require_a_session() {
        let store = Arc::new(AccountStore::new());
        store.create("alice").unwrap();
        let mut session = Session::new(Arc::clone(&store));

        for line in ["deposit 5", "withdraw 1", "query", "end"] {
            assert_eq!(run(&mut session, line), "ERROR: Must be in active session");
        }
        assert_eq!(store.query("alice"), Ok(0.0));
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn serve_is_refused_while_active() {
        let store = Arc::new(AccountStore::new());
        store.create("alice").unwrap();
        store.create("bob").unwrap();
        let mut session = Session::new(Arc::clone(&store));

        run(&mut session, "serve alice");
        assert_eq!(run(&mut session, "serve bob"), "ERROR: Must not be in active session");
        assert_eq!(session.account(), Some("alice"));
        assert_eq!(store.start_session("bob"), Ok(()));
    }

    #[test]
    fn create_works_in_any_state() {
        let store = Arc::new(AccountStore::new());
        let mut session = Session::new(Arc::clone(&store));
        run(&mut session, "create alice");
        run(&mut session, "serve alice");

        assert_eq!(run(&mut session, "create bob"), "SUCCESS: New account created");
        assert_eq!(run(&mut session, "create alice"), "ERROR: Account already exists");
        assert_eq!(session.account(), Some("alice"));
    }

    #[test]
    fn serve_reports_store_errors() {
        let store = Arc::new(AccountStore::new());
        store.create("alice").unwrap();
        store.start_session("alice").unwrap();
        let mut session = Session::new(Arc::clone(&store));

        assert_eq!(run(&mut session, "serve nobody"), "ERROR: Account does not exist");
        assert_eq!(run(&mut session, "serve alice"), "ERROR: Account already in session");
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn overdraw_is_rejected() {
        let store = Arc::new(AccountStore::new());
        let mut session = Session::new(Arc::clone(&store));
        run(&mut session, "create alice");
        run(&mut session, "serve alice");
        run(&mut session, "deposit 10");

        assert_eq!(run(&mut session, "withdraw 10.01"), "ERROR: Insufficient funds");
        assert_eq!(store.query("alice"), Ok(10.0));
    }

    #[test]
    fn quit_and_drop_release_the_account() {
        let store = Arc::new(AccountStore::new());
        store.create("alice").unwrap();

        let mut session = Session::new(Arc::clone(&store));
        run(&mut session, "serve alice");
        assert_eq!(session.execute(&Command::Quit), Outcome::Close);
        assert_eq!(store.end_session("alice"), Err(StoreError::NotInSession));

        let mut session = Session::new(Arc::clone(&store));
        run(&mut session, "serve alice");
        drop(session);
        assert_eq!(store.start_session("alice"), Ok(()));
    }

    #[test]
    fn close_without_session_is_a_no_op() {
        let store = Arc::new(AccountStore::new());
        let mut session = Session::new(store);
        assert_eq!(session.close(), None);
    }
}
