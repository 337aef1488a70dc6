//! On-disk account encoding.
//!
//! Timestamps are stored as Unix milliseconds and dates as days from the
//! common era, so the record only holds primitives.

use chrono::{DateTime, Datelike, NaiveDate};

use orbis_core::{Account, AccountId, StoreError};

#[derive(bincode::Encode, bincode::Decode, Debug, Clone, PartialEq)]
pub(crate) struct AccountRecord {
    id: String,
    balance: u64,
    level: u32,
    activity_score: f64,
    last_work_millis: Option<i64>,
    last_active_days: Option<i32>,
    version: u64,
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.as_str().to_string(),
            balance: account.balance,
            level: account.level,
            activity_score: account.activity_score,
            last_work_millis: account.last_work_time.map(|t| t.timestamp_millis()),
            last_active_days: account.last_active_date.map(|d| d.num_days_from_ce()),
            version: account.version,
        }
    }
}

impl TryFrom<AccountRecord> for Account {
    type Error = StoreError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let last_work_time = record
            .last_work_millis
            .map(|ms| {
                DateTime::from_timestamp_millis(ms)
                    .ok_or_else(|| StoreError::Corrupted(format!("bad work timestamp {ms}")))
            })
            .transpose()?;
        let last_active_date = record
            .last_active_days
            .map(|days| {
                NaiveDate::from_num_days_from_ce_opt(days)
                    .ok_or_else(|| StoreError::Corrupted(format!("bad active date {days}")))
            })
            .transpose()?;

        Ok(Account {
            id: AccountId::new(record.id),
            balance: record.balance,
            level: record.level,
            activity_score: record.activity_score,
            last_work_time,
            last_active_date,
            version: record.version,
        })
    }
}

pub(crate) fn encode(account: &Account) -> Result<Vec<u8>, StoreError> {
    bincode::encode_to_vec(AccountRecord::from(account), bincode::config::standard())
        .map_err(|e| StoreError::Corrupted(e.to_string()))
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Account, StoreError> {
    let (record, _): (AccountRecord, _) =
        bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;
    Account::try_from(record)
}
