//! A single named account.

use super::{StoreError, StoreResult};

/// Maximum account name length in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Largest balance an account may hold. Keeps every balance finite and
/// renderable inside one response frame.
pub const MAX_BALANCE: f64 = 1e15;

/// Named balance record.
///
/// The name never changes after creation. Balance and session flag are only
/// reachable through the store, which holds its lock for every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    name: String,
    balance: f64,
    in_session: bool,
}

impl Account {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            balance: 0.0,
            in_session: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn in_session(&self) -> bool {
        self.in_session
    }

    pub(crate) fn set_in_session(&mut self, active: bool) {
        self.in_session = active;
    }

    /// Credit the account. Leaves the balance untouched on failure.
    pub(crate) fn credit(&mut self, amount: f64) -> StoreResult<()> {
        let balance = self.balance + amount;
        if balance > MAX_BALANCE {
            return Err(StoreError::BalanceLimitExceeded);
        }
        self.balance = balance;
        Ok(())
    }

    /// Debit the account. Leaves the balance untouched on failure.
    pub(crate) fn debit(&mut self, amount: f64) -> StoreResult<()> {
        if amount > self.balance {
            return Err(StoreError::InsufficientFunds);
        }
        self.balance -= amount;
        Ok(())
    }
}
