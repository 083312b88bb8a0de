//! Point-in-time dump of the store.

use std::fmt;

use super::account::Account;

/// One account as seen by a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub name: String,
    pub balance: f64,
    pub in_session: bool,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name().to_string(),
            balance: account.balance(),
            in_session: account.in_session(),
        }
    }
}

/// Ordered copy of every account, taken under the store lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    accounts: Vec<AccountSnapshot>,
}

impl Snapshot {
    pub(crate) fn new(accounts: Vec<AccountSnapshot>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &[AccountSnapshot] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Number of accounts currently bound to a session.
    pub fn sessions_active(&self) -> usize {
        self.accounts.iter().filter(|a| a.in_session).count()
    }

    pub fn get(&self, name: &str) -> Option<&AccountSnapshot> {
        self.accounts.iter().find(|a| a.name == name)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.accounts.is_empty() {
            return write!(f, "(no accounts)");
        }
        for (i, account) in self.accounts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let state = if account.in_session { "IN SESSION" } else { "idle" };
            write!(f, "{}\t{:.2}\t{}", account.name, account.balance, state)?;
        }
        Ok(())
    }
}
