//! In-memory [`AccountStore`] for tests and single-process deployments.
//!
//! The production bot uses RocksDB (orbis-store). Both share the same
//! locking discipline through [`LockTable`], so behaviour under contention
//! is identical.

use std::time::Duration;

use dashmap::DashMap;

use crate::constants::DEFAULT_LOCK_TIMEOUT_MS;
use crate::error::StoreError;
use crate::locks::LockTable;
use crate::traits::AccountStore;
use crate::types::{Account, AccountId, AccountUpdate};

pub struct MemoryAccountStore {
    accounts: DashMap<AccountId, Account>,
    locks: LockTable,
}

impl MemoryAccountStore {
    /// Create an empty store with the default lock timeout.
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS))
    }

    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            accounts: DashMap::new(),
            locks: LockTable::new(timeout),
        }
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all balances. Used by conservation checks.
    pub fn total_balance(&self) -> u128 {
        self.accounts
            .iter()
            .map(|entry| entry.value().balance as u128)
            .sum()
    }

    /// Read and version-check an account. Caller must hold its lock.
    fn checked(&self, id: &AccountId, expected_version: u64) -> Result<Account, StoreError> {
        let current = self
            .accounts
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::ConcurrentModification(id.clone()));
        }
        Ok(current)
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryAccountStore {
    fn get(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).map(|entry| entry.value().clone()))
    }

    fn create_if_absent(&self, template: Account) -> Result<Account, StoreError> {
        let id = template.id.clone();
        self.locks.with_lock(&id, || {
            let entry = self.accounts.entry(id.clone()).or_insert(template);
            Ok(entry.value().clone())
        })
    }

    fn update(
        &self,
        id: &AccountId,
        expected_version: u64,
        updates: &[AccountUpdate],
    ) -> Result<Account, StoreError> {
        self.locks.with_lock(id, || {
            let next = self.checked(id, expected_version)?.updated(updates);
            self.accounts.insert(id.clone(), next.clone());
            Ok(next)
        })
    }

    fn update_pair(
        &self,
        first: (&AccountId, u64, &[AccountUpdate]),
        second: (&AccountId, u64, &[AccountUpdate]),
    ) -> Result<(Account, Account), StoreError> {
        let (a_id, a_version, a_updates) = first;
        let (b_id, b_version, b_updates) = second;

        self.locks.with_pair(a_id, b_id, || {
            // Check both before writing either.
            let a_next = self.checked(a_id, a_version)?.updated(a_updates);
            let b_next = self.checked(b_id, b_version)?.updated(b_updates);
            self.accounts.insert(a_id.clone(), a_next.clone());
            self.accounts.insert(b_id.clone(), b_next.clone());
            Ok((a_next, b_next))
        })
    }

    fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
