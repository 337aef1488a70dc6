//! Per-account mutual exclusion with bounded waits.
//!
//! Stores wrap every read-modify-write in [`LockTable::with_lock`] or
//! [`LockTable::with_pair`]. Pairs are always acquired in ascending
//! [`AccountId`] order, so two transfers in opposite directions cannot
//! deadlock. A lock that cannot be acquired within the table's timeout
//! yields [`StoreError::Timeout`].

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::warn;

use crate::error::StoreError;
use crate::types::AccountId;

/// Lazily-populated map of account id to its mutex.
pub struct LockTable {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl LockTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Run `f` while holding the lock for `id`.
    pub fn with_lock<T>(
        &self,
        id: &AccountId,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let handle = self.handle(id);
        let _guard = self.acquire(&handle, id)?;
        f()
    }

    /// Run `f` while holding the locks for two distinct accounts.
    pub fn with_pair<T>(
        &self,
        a: &AccountId,
        b: &AccountId,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if a == b {
            return Err(StoreError::InvalidRequest(format!(
                "pair update on a single account: {a}"
            )));
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let lo_handle = self.handle(lo);
        let hi_handle = self.handle(hi);

        let _lo = self.acquire(&lo_handle, lo)?;
        let _hi = self.acquire(&hi_handle, hi)?;
        f()
    }

    fn handle(&self, id: &AccountId) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(id) {
            return Arc::clone(existing.value());
        }
        let entry = self
            .locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }

    fn acquire<'a>(
        &self,
        handle: &'a Mutex<()>,
        id: &AccountId,
    ) -> Result<MutexGuard<'a, ()>, StoreError> {
        handle.try_lock_for(self.timeout).ok_or_else(|| {
            let millis = self.timeout.as_millis() as u64;
            warn!(account = %id, millis, "account lock wait timed out");
            StoreError::Timeout { millis }
        })
    }
}
