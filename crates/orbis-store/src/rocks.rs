//! RocksDB-backed persistent account storage.
//!
//! Implements [`AccountStore`] using two column families: `accounts` holds
//! one bincode record per participant and `metadata` holds the schema
//! version. Every read-modify-write runs under the account's lock from a
//! [`LockTable`]; pair updates are committed through a single
//! [`WriteBatch`] so both accounts change or neither does.

use std::path::Path;
use std::time::Duration;

use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use tracing::{debug, info};

use orbis_core::locks::LockTable;
use orbis_core::{Account, AccountId, AccountStore, AccountUpdate, StoreError};

use crate::config::StoreConfig;
use crate::record;

// --- Column family names ---

const CF_ACCOUNTS: &str = "accounts";
const CF_METADATA: &str = "metadata";

const ALL_CFS: &[&str] = &[CF_ACCOUNTS, CF_METADATA];

// --- Metadata keys ---

const META_SCHEMA_VERSION: &[u8] = b"schema_version";

const SCHEMA_VERSION: u32 = 1;

pub struct RocksAccountStore {
    db: DB,
    locks: LockTable,
}

impl RocksAccountStore {
    /// Open or create the account database at `path`.
    ///
    /// A fresh database is stamped with the current schema version; an
    /// existing one must carry the same version.
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self {
            db,
            locks: LockTable::new(Duration::from_millis(config.lock_timeout_ms)),
        };
        store.check_schema()?;

        info!(path = %path.as_ref().display(), "account store opened");
        Ok(store)
    }

    /// Open the database at the configured default location.
    pub fn open_default(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open(config.db_path(), config)
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Number of stored accounts.
    pub fn account_count(&self) -> Result<usize, StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    // --- Internal helpers ---

    fn check_schema(&self) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self
            .db
            .get_cf(cf, META_SCHEMA_VERSION)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corrupted("invalid schema version length".into())
                })?;
                let found = u32::from_le_bytes(raw);
                if found != SCHEMA_VERSION {
                    return Err(StoreError::Corrupted(format!(
                        "schema version {found}, expected {SCHEMA_VERSION}"
                    )));
                }
                Ok(())
            }
            None => {
                debug!(version = SCHEMA_VERSION, "stamping schema version");
                self.db
                    .put_cf(cf, META_SCHEMA_VERSION, SCHEMA_VERSION.to_le_bytes())
                    .map_err(|e| StoreError::Unavailable(e.to_string()))
            }
        }
    }

    /// Get a column family handle.
    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Unavailable(format!("missing column family: {name}")))
    }

    fn read(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        match self
            .db
            .get_cf(cf, id.as_bytes())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        {
            Some(bytes) => record::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Read and version-check an account. Caller must hold its lock.
    fn checked(&self, id: &AccountId, expected_version: u64) -> Result<Account, StoreError> {
        let current = self
            .read(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if current.version != expected_version {
            return Err(StoreError::ConcurrentModification(id.clone()));
        }
        Ok(current)
    }

    fn write(&self, accounts: &[&Account]) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        for account in accounts {
            batch.put_cf(cf, account.id.as_bytes(), record::encode(account)?);
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl AccountStore for RocksAccountStore {
    fn get(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        self.read(id)
    }

    fn create_if_absent(&self, template: Account) -> Result<Account, StoreError> {
        let id = template.id.clone();
        self.locks.with_lock(&id, || {
            if let Some(existing) = self.read(&id)? {
                return Ok(existing);
            }
            self.write(&[&template])?;
            debug!(account = %id, "account created");
            Ok(template)
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
            self.write(&[&next])?;
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
            let a_next = self.checked(a_id, a_version)?.updated(a_updates);
            let b_next = self.checked(b_id, b_version)?.updated(b_updates);
            self.write(&[&a_next, &b_next])?;
            Ok((a_next, b_next))
        })
    }

    fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();

        let iter = self.db.iterator_cf(cf, rocksdb::IteratorMode::Start);
        for item in iter {
            let (_, value_bytes) = item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            accounts.push(record::decode(&value_bytes)?);
        }

        Ok(accounts)
    }
}
