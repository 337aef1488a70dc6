//! # orbis-store - Durable account storage.
//!
//! [`RocksAccountStore`] implements [`AccountStore`](orbis_core::AccountStore)
//! on RocksDB. Records are bincode-encoded, one per account, keyed by the
//! raw account id bytes.

pub mod config;
mod record;
pub mod rocks;

pub use config::StoreConfig;
pub use rocks::RocksAccountStore;
