//! In-memory account store.
//!
//! # Data Flow
//! ```text
//! Session handler
//!     → AccountStore (single store-wide mutex)
//!     → table.rs (256 fixed buckets, chained)
//!     → account.rs (balance + session flag)
//!
//! Snapshot reporter
//!     → AccountStore::snapshot (same mutex)
//!     → snapshot.rs (ordered, printable dump)
//! ```
//!
//! # Design Decisions
//! - One lock for the whole store: at most one operation runs at a time
//! - Every operation returns a result code; none panics or half-applies
//! - Deterministic bucket placement keeps snapshots reproducible

pub mod account;
pub mod snapshot;
pub mod table;

use std::sync::Mutex;
use thiserror::Error;

pub use account::{Account, MAX_BALANCE};
pub use snapshot::{AccountSnapshot, Snapshot};
use table::AccountTable;

/// Errors returned by store operations.
///
/// The display text is the wire text of the matching `ERROR:` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("Account does not exist")]
    AccountNotFound,

    #[error("Account already in session")]
    AlreadyInSession,

    #[error("Account not in session")]
    NotInSession,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Balance limit exceeded")]
    BalanceLimitExceeded,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe account store shared by every connection.
#[derive(Debug, Default)]
pub struct AccountStore {
    table: Mutex<AccountTable>,
}

impl AccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the table.
    fn with_table<T>(&self, f: impl FnOnce(&mut AccountTable) -> T) -> T {
        let mut table = self.table.lock().expect("account store mutex poisoned");
        f(&mut table)
    }

    /// Create a new account with a zero balance.
    pub fn create(&self, name: &str) -> StoreResult<()> {
        self.with_table(|table| {
            if table.get(name).is_some() {
                return Err(StoreError::AccountAlreadyExists);
            }
            table.insert(Account::new(name));
            Ok(())
        })
    }

    /// Mark an account as bound to a session.
    pub fn start_session(&self, name: &str) -> StoreResult<()> {
        self.with_table(|table| {
            let account = table.get_mut(name).ok_or(StoreError::AccountNotFound)?;
            if account.in_session() {
                return Err(StoreError::AlreadyInSession);
            }
            account.set_in_session(true);
            Ok(())
        })
    }

    /// Release an account's session binding.
    pub fn end_session(&self, name: &str) -> StoreResult<()> {
        self.with_table(|table| {
            let account = table.get_mut(name).ok_or(StoreError::AccountNotFound)?;
            if !account.in_session() {
                return Err(StoreError::NotInSession);
            }
            account.set_in_session(false);
            Ok(())
        })
    }

    /// Add `amount` to the balance, failing if the result would pass
    /// [`MAX_BALANCE`]. `amount` must be non-negative.
    pub fn deposit(&self, name: &str, amount: f64) -> StoreResult<()> {
        self.with_table(|table| {
            let account = table.get_mut(name).ok_or(StoreError::AccountNotFound)?;
            account.credit(amount)
        })
    }

    /// Remove `amount` from the balance, failing if it exceeds the balance.
    pub fn withdraw(&self, name: &str, amount: f64) -> StoreResult<()> {
        self.with_table(|table| {
            let account = table.get_mut(name).ok_or(StoreError::AccountNotFound)?;
            account.debit(amount)
        })
    }

    /// Current balance of an account.
    pub fn query(&self, name: &str) -> StoreResult<f64> {
        self.with_table(|table| {
            table
                .get(name)
                .map(Account::balance)
                .ok_or(StoreError::AccountNotFound)
        })
    }

    /// Consistent copy of every account, in bucket order.
    pub fn snapshot(&self) -> Snapshot {
        self.with_table(|table| Snapshot::new(table.iter().map(AccountSnapshot::from).collect()))
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.with_table(|table| table.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn duplicate_create_fails_and_keeps_balance() {
        let store = AccountStore::new();
        store.create("alice").unwrap();
        store.start_session("alice").unwrap();
        store.deposit("alice", 5.0).unwrap();

        assert_eq!(store.create("alice"), Err(StoreError::AccountAlreadyExists));
        assert_eq!(store.query("alice"), Ok(5.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fresh_account_has_zero_balance() {
        let store = AccountStore::new();
        store.create("bob").unwrap();
        assert_eq!(store.query("bob"), Ok(0.0));
    }

    #[test]
    fn deposit_then_query_adds_exactly() {
        let store = AccountStore::new();
        store.create("alice").unwrap();
        store.deposit("alice", 100.0).unwrap();
        store.deposit("alice", 0.25).unwrap();
        assert_eq!(store.query("alice"), Ok(100.25));
    }

    #[test]
    fn withdraw_never_goes_negative() {
        let store = AccountStore::new();
        store.create("alice").unwrap();
        store.deposit("alice", 50.0).unwrap();

        assert_eq!(store.withdraw("alice", 50.5), Err(StoreError::InsufficientFunds));
        assert_eq!(store.query("alice"), Ok(50.0));

        store.withdraw("alice", 20.0).unwrap();
        assert_eq!(store.query("alice"), Ok(30.0));

        store.withdraw("alice", 30.0).unwrap();
        assert_eq!(store.query("alice"), Ok(0.0));
    }

    #[test]
    fn deposit_past_balance_limit_is_refused() {
        let store = AccountStore::new();
        store.create("whale").unwrap();
        store.deposit("whale", 10.0).unwrap();

        assert_eq!(store.deposit("whale", 1e300), Err(StoreError::BalanceLimitExceeded));
        assert_eq!(store.deposit("whale", MAX_BALANCE), Err(StoreError::BalanceLimitExceeded));
        assert_eq!(store.query("whale"), Ok(10.0));

        store.deposit("whale", MAX_BALANCE - 10.0).unwrap();
        assert_eq!(store.query("whale"), Ok(MAX_BALANCE));
    }

    #[test]
    fn missing_account_is_reported_everywhere() {
        let store = AccountStore::new();
        assert_eq!(store.start_session("ghost"), Err(StoreError::AccountNotFound));
        assert_eq!(store.end_session("ghost"), Err(StoreError::AccountNotFound));
        assert_eq!(store.deposit("ghost", 1.0), Err(StoreError::AccountNotFound));
        assert_eq!(store.withdraw("ghost", 1.0), Err(StoreError::AccountNotFound));
        assert_eq!(store.query("ghost"), Err(StoreError::AccountNotFound));
    }

    #[test]
    fn session_flag_toggles_only_through_start_and_end() {
        let store = AccountStore::new();
        store.create("alice").unwrap();

        assert_eq!(store.end_session("alice"), Err(StoreError::NotInSession));
        store.start_session("alice").unwrap();
        assert_eq!(store.start_session("alice"), Err(StoreError::AlreadyInSession));
        store.end_session("alice").unwrap();
        store.start_session("alice").unwrap();
    }

    #[test]
    fn concurrent_start_session_has_single_winner() {
        let store = Arc::new(AccountStore::new());
        store.create("shared").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.start_session("shared"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| *r == Err(StoreError::AlreadyInSession)));
    }

    #[test]
    fn concurrent_deposits_are_not_lost() {
        let store = Arc::new(AccountStore::new());
        store.create("pool").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.deposit("pool", 1.0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.query("pool"), Ok(1000.0));
    }

    #[test]
    fn error_display_matches_wire_text() {
        assert_eq!(StoreError::InsufficientFunds.to_string(), "Insufficient funds");
        assert_eq!(StoreError::AccountNotFound.to_string(), "Account does not exist");
        assert_eq!(StoreError::BalanceLimitExceeded.to_string(), "Balance limit exceeded");
    }
}
