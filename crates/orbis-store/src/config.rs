//! Storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use orbis_core::constants::DEFAULT_LOCK_TIMEOUT_MS;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Upper bound on waiting for a per-account lock.
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orbis");

        Self {
            data_dir,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    /// Path to the RocksDB account database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("accounts")
    }
}
