//! Cross-crate test suite for Orbis.
//!
//! Integration tests drive [`EconomyEngine`](orbis_economy::EconomyEngine)
//! over both store backends, including from many threads at once, and
//! check the ledger invariants that must survive contention.

pub mod helpers;
