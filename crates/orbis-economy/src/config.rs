//! Economy configuration.
//!
//! Aggregates every component's tunables. Each section deserializes on its
//! own with defaults, so a config file only lists what it overrides.

use serde::{Deserialize, Serialize};

use orbis_core::constants::{ACTIVITY_FLOOR, DEFAULT_MAX_ATTEMPTS};
use orbis_core::LevelCurve;

use crate::activity::ActivityTracker;
use crate::cooldown::CooldownGuard;
use crate::ranking::RankingService;
use crate::reward::RewardEngine;

/// Bounded retry for read-modify-write conflicts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EconomyConfig {
    /// Activity score for newly created accounts.
    pub starting_activity: f64,
    pub level: LevelCurve,
    pub activity: ActivityTracker,
    pub cooldown: CooldownGuard,
    pub reward: RewardEngine,
    pub ranking: RankingService,
    pub retry: RetryPolicy,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_activity: ACTIVITY_FLOOR,
            level: LevelCurve::default(),
            activity: ActivityTracker::default(),
            cooldown: CooldownGuard::default(),
            reward: RewardEngine::default(),
            ranking: RankingService::default(),
            retry: RetryPolicy::default(),
        }
    }
}
