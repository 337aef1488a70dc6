//! Trait interfaces for the Orbis economy.
//!
//! These traits define the contracts between crates:
//! - [`AccountStore`] - durable keyed account storage (orbis-store implements,
//!   [`MemoryAccountStore`](crate::memory::MemoryAccountStore) for tests)
//! - [`FortuneSource`] - per-day income modifier (orbis-economy implements)

use chrono::NaiveDate;

use crate::constants::NEUTRAL_FORTUNE;
use crate::error::StoreError;
use crate::types::{Account, AccountId, AccountUpdate};

/// Keyed storage holding one [`Account`] per participant.
///
/// Every mutating method is atomic and isolated with respect to other
/// mutations of the same account. Writers pass the `version` they read;
/// a mismatch is reported as [`StoreError::ConcurrentModification`] and
/// nothing is written. Lock waits are bounded and surface
/// [`StoreError::Timeout`] instead of blocking indefinitely.
pub trait AccountStore: Send + Sync {
    /// Look up an account. Returns `None` if it was never created.
    fn get(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Insert `template` unless an account with its id already exists.
    ///
    /// Returns the stored account: the existing one untouched, or the
    /// newly inserted template.
    fn create_if_absent(&self, template: Account) -> Result<Account, StoreError>;

    /// Apply `updates` to one account if its version still equals
    /// `expected_version`. Returns the committed account.
    fn update(
        &self,
        id: &AccountId,
        expected_version: u64,
        updates: &[AccountUpdate],
    ) -> Result<Account, StoreError>;

    /// Apply updates to two distinct accounts as one unit: both commit or
    /// neither does. Locks are taken in ascending id order.
    fn update_pair(
        &self,
        first: (&AccountId, u64, &[AccountUpdate]),
        second: (&AccountId, u64, &[AccountUpdate]),
    ) -> Result<(Account, Account), StoreError>;

    /// Snapshot of every account, in no particular order.
    fn list_all(&self) -> Result<Vec<Account>, StoreError>;

    /// Fetch an account, creating it from `template` if absent.
    ///
    /// Default implementation: [`get`](Self::get) then
    /// [`create_if_absent`](Self::create_if_absent).
    fn get_or_create(&self, template: Account) -> Result<Account, StoreError> {
        match self.get(&template.id)? {
            Some(account) => Ok(account),
            None => self.create_if_absent(template),
        }
    }
}

/// Per-participant, per-day income modifier applied to the work action.
pub trait FortuneSource: Send + Sync {
    fn income_multiplier(&self, id: &AccountId, day: NaiveDate) -> f64;
}

/// Fortune source that never changes income.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralFortune;

impl FortuneSource for NeutralFortune {
    fn income_multiplier(&self, _id: &AccountId, _day: NaiveDate) -> f64 {
        NEUTRAL_FORTUNE
    }
}
