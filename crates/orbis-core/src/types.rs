//! Account record and the typed updates the store accepts.
//!
//! Balances are whole currency units in a `u64`, so the non-negative
//! balance invariant is carried by the type. Every committed change bumps
//! [`Account::version`], which stores use for compare-and-swap.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ACTIVITY_FLOOR, STARTING_LEVEL};

/// Stable participant identifier (the chat platform's user id as a string).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The acting side of an event: who, and whether it is an automated account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: AccountId,
    /// Bots, webhooks and other non-human authors.
    pub automated: bool,
}

impl Participant {
    pub fn human(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            automated: false,
        }
    }

    pub fn automated(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            automated: true,
        }
    }
}

/// One participant's persistent economy record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub balance: u64,
    /// Derived from `balance + activity_score`; refreshed on activity updates.
    pub level: u32,
    pub activity_score: f64,
    /// Set only by the work action.
    pub last_work_time: Option<DateTime<Utc>>,
    /// Set by message-driven activity updates.
    pub last_active_date: Option<NaiveDate>,
    /// Incremented on every committed update.
    pub version: u64,
}

impl Account {
    /// A fresh account with the default starting values.
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self::with_activity(id, ACTIVITY_FLOOR)
    }

    /// A fresh account starting from the given activity score.
    pub fn with_activity(id: impl Into<AccountId>, activity_score: f64) -> Self {
        Self {
            id: id.into(),
            balance: 0,
            level: STARTING_LEVEL,
            activity_score,
            last_work_time: None,
            last_active_date: None,
            version: 0,
        }
    }

    /// Value fed into the level curve.
    pub fn level_total(&self) -> f64 {
        self.balance as f64 + self.activity_score
    }

    /// Apply one update in place. Does not touch `version`.
    pub fn apply(&mut self, update: &AccountUpdate) {
        match update {
            AccountUpdate::Balance(balance) => self.balance = *balance,
            AccountUpdate::Activity(snapshot) => {
                self.activity_score = snapshot.activity_score;
                self.level = snapshot.level.max(STARTING_LEVEL);
                self.last_active_date = Some(snapshot.last_active_date);
            }
            AccountUpdate::LastWork(at) => self.last_work_time = Some(*at),
        }
    }

    /// Copy of this account with all updates applied and the version bumped.
    pub fn updated(&self, updates: &[AccountUpdate]) -> Self {
        let mut next = self.clone();
        for update in updates {
            next.apply(update);
        }
        next.version = self.version.wrapping_add(1);
        next
    }
}

/// Activity state written after a qualifying message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ActivitySnapshot {
    pub activity_score: f64,
    pub level: u32,
    pub last_active_date: NaiveDate,
}

/// The closed set of field updates an [`AccountStore`](crate::traits::AccountStore)
/// accepts. Several may be committed together in one atomic update.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum AccountUpdate {
    Balance(u64),
    Activity(ActivitySnapshot),
    LastWork(DateTime<Utc>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_account_defaults() {
        let acct = Account::new("42");
        assert_eq!(acct.id.as_str(), "42");
        assert_eq!(acct.balance, 0);
        assert_eq!(acct.level, 1);
        assert_eq!(acct.activity_score, 100.0);
        assert!(acct.last_work_time.is_none());
        assert!(acct.last_active_date.is_none());
        assert_eq!(acct.version, 0);
    }

    #[test]
    fn updated_applies_all_and_bumps_version() {
        let acct = Account::new("a");
        let now = Utc::now();
        let next = acct.updated(&[
            AccountUpdate::Balance(250),
            AccountUpdate::LastWork(now),
            AccountUpdate::Activity(ActivitySnapshot {
                activity_score: 101.25,
                level: 3,
                last_active_date: day(2024, 5, 1),
            }),
        ]);
        assert_eq!(next.balance, 250);
        assert_eq!(next.last_work_time, Some(now));
        assert_eq!(next.activity_score, 101.25);
        assert_eq!(next.level, 3);
        assert_eq!(next.last_active_date, Some(day(2024, 5, 1)));
        assert_eq!(next.version, 1);
        // input untouched
        assert_eq!(acct.balance, 0);
        assert_eq!(acct.version, 0);
    }

    #[test]
    fn activity_update_never_sets_level_below_one() {
        let mut acct = Account::new("a");
        acct.apply(&AccountUpdate::Activity(ActivitySnapshot {
            activity_score: 100.0,
            level: 0,
            last_active_date: day(2024, 1, 1),
        }));
        assert_eq!(acct.level, 1);
    }

    #[test]
    fn level_total_sums_balance_and_activity() {
        let mut acct = Account::new("a");
        acct.balance = 400;
        assert_eq!(acct.level_total(), 500.0);
    }

    #[test]
    fn account_id_ordering_is_lexicographic() {
        let mut ids = vec![AccountId::from("b"), AccountId::from("a"), AccountId::from("c")];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(AccountId::as_str).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
