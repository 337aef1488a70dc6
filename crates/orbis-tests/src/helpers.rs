//! Shared helpers for integration tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use orbis_core::{AccountId, AccountStore, MemoryAccountStore};
use orbis_economy::{EconomyConfig, EconomyEngine, RetryPolicy, RewardEngine};
use orbis_store::{RocksAccountStore, StoreConfig};

/// Fixed instant used as "now" throughout the suite.
pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_700_000, 0).expect("valid timestamp")
}

/// Config where every work call pays exactly `income` to a fresh account
/// (activity 100, level 1), has no cooldown, and retries generously.
pub fn fixed_work_config(income: u64) -> EconomyConfig {
    let factor = income as f64 / 100.0;
    let mut config = EconomyConfig {
        reward: RewardEngine {
            work_min_factor: factor,
            work_max_factor: factor,
            ..RewardEngine::default()
        },
        retry: RetryPolicy {
            max_attempts: 10_000,
        },
        ..EconomyConfig::default()
    };
    config.cooldown.window_secs = 0;
    config
}

/// Default economy rules with a retry budget large enough for heavy
/// contention.
pub fn contended_config() -> EconomyConfig {
    EconomyConfig {
        retry: RetryPolicy {
            max_attempts: 10_000,
        },
        ..EconomyConfig::default()
    }
}

pub fn memory_engine(config: EconomyConfig) -> (Arc<EconomyEngine>, Arc<MemoryAccountStore>) {
    let store = Arc::new(MemoryAccountStore::new());
    let engine = Arc::new(EconomyEngine::new(store.clone(), config));
    (engine, store)
}

/// Engine over a RocksDB store in a fresh temp directory. Keep the
/// returned `TempDir` alive for the duration of the test.
pub fn rocks_engine(
    config: EconomyConfig,
) -> (Arc<EconomyEngine>, Arc<RocksAccountStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        RocksAccountStore::open(dir.path().join("accounts"), &StoreConfig::default())
            .expect("open rocks store"),
    );
    let engine = Arc::new(EconomyEngine::new(store.clone(), config));
    (engine, store, dir)
}

/// Sum of all balances in a store.
pub fn total_balance(store: &dyn AccountStore) -> u128 {
    store
        .list_all()
        .expect("list accounts")
        .iter()
        .map(|a| a.balance as u128)
        .sum()
}

pub fn balance_of(store: &dyn AccountStore, id: &str) -> u64 {
    store
        .get(&AccountId::from(id))
        .expect("get account")
        .map(|a| a.balance)
        .unwrap_or(0)
}
