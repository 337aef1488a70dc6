//! # orbis-economy - Economy rules and the event handler that applies them.
//!
//! Pure components, each carrying its own serde-loadable configuration:
//! - [`ActivityTracker`]: decay-on-inactivity and per-message increment
//! - [`CooldownGuard`]: minimum interval between work invocations
//! - [`RewardEngine`]: work and message income draws
//! - [`TransferLedger`]: transfer validation and balance arithmetic
//! - [`RankingService`]: stable, paginated level leaderboard
//!
//! [`EconomyEngine`] resolves accounts through an
//! [`AccountStore`](orbis_core::AccountStore), runs the components, and
//! commits each result as one versioned update, retrying on conflicts.

pub mod activity;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod fortune;
pub mod ranking;
pub mod reward;
pub mod transfer;

pub use activity::{ActivityTracker, ActivityUpdate};
pub use config::{EconomyConfig, RetryPolicy};
pub use cooldown::{CooldownGuard, CooldownStatus};
pub use engine::{EconomyEngine, MessageOutcome, TransferReceipt, WorkOutcome};
pub use fortune::{DailyFortune, Fortune};
pub use ranking::{RankEntry, RankPage, RankingService};
pub use reward::RewardEngine;
pub use transfer::TransferLedger;
