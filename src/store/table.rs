//! Fixed-size chained hash table.
//!
//! # Placement
//! ```text
//! bucket(name) = (sum of name bytes) mod 256
//! ```
//! Collisions are appended to the bucket's chain in insertion order. The
//! table never resizes; lookups scan the chain linearly. That is fine for the
//! small account counts a single store-wide lock can serve anyway.

use super::account::Account;

/// Number of buckets in the table.
pub const BUCKET_COUNT: usize = 256;

/// Bucket index for an account name.
pub fn bucket_index(name: &str) -> usize {
    let sum = name
        .bytes()
        .fold(0usize, |acc, byte| acc.wrapping_add(byte as usize));
    sum % BUCKET_COUNT
}

#[derive(Debug)]
pub struct AccountTable {
    buckets: Vec<Vec<Account>>,
    len: usize,
}

impl Default for AccountTable {
    fn default() -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKET_COUNT],
            len: 0,
        }
    }
}

impl AccountTable {
    pub fn get(&self, name: &str) -> Option<&Account> {
        self.buckets[bucket_index(name)]
            .iter()
            .find(|account| account.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Account> {
        self.buckets[bucket_index(name)]
            .iter_mut()
            .find(|account| account.name() == name)
    }

    /// Append to the chain. Callers check for duplicates first.
    pub fn insert(&mut self, account: Account) {
        let index = bucket_index(account.name());
        self.buckets[index].push(account);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterate in bucket order, then chain order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.buckets.iter().flatten()
    }
}
