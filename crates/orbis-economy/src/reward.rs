//! Income computation for the work action and for qualifying messages.
//!
//! - Work: uniform integer in
//!   `[round(activity * level * 15), round(activity * level * 20)]`,
//!   scaled by the day's fortune multiplier and truncated.
//! - Message: 3-in-10 chance of `floor(activity * level * 10)`, times 10 on
//!   the first message after a reset or the first message ever.
//!
//! Every call consumes fresh draws from the supplied RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use orbis_core::constants::{
    MESSAGE_FACTOR, MESSAGE_REWARD_OUTCOMES, MESSAGE_REWARD_WINS, RESET_DAY_MULTIPLIER,
    WORK_MAX_FACTOR, WORK_MIN_FACTOR,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RewardEngine {
    pub work_min_factor: f64,
    pub work_max_factor: f64,
    pub message_factor: f64,
    /// Winning outcomes out of `message_outcomes`.
    pub message_wins: u32,
    pub message_outcomes: u32,
    pub reset_multiplier: u64,
}

impl Default for RewardEngine {
    fn default() -> Self {
        Self {
            work_min_factor: WORK_MIN_FACTOR,
            work_max_factor: WORK_MAX_FACTOR,
            message_factor: MESSAGE_FACTOR,
            message_wins: MESSAGE_REWARD_WINS,
            message_outcomes: MESSAGE_REWARD_OUTCOMES,
            reset_multiplier: RESET_DAY_MULTIPLIER,
        }
    }
}

impl RewardEngine {
    /// Inclusive income range for the work action before the fortune multiplier.
    pub fn work_range(&self, activity_score: f64, level: u32) -> (u64, u64) {
        let base = activity_score * level as f64;
        let lo = to_units((base * self.work_min_factor).round());
        let hi = to_units((base * self.work_max_factor).round());
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }

    /// Income for one work invocation.
    ///
    /// Negative or non-finite fortune multipliers pay nothing.
    pub fn work_income<R: Rng + ?Sized>(
        &self,
        activity_score: f64,
        level: u32,
        fortune_multiplier: f64,
        rng: &mut R,
    ) -> u64 {
        let (lo, hi) = self.work_range(activity_score, level);
        let draw = rng.gen_range(lo..=hi);
        to_units((draw as f64 * fortune_multiplier).trunc())
    }

    /// Income for one qualifying message, computed from the post-update
    /// activity score and level.
    ///
    /// `first_activity` is true when the account had no previous active date.
    pub fn message_income<R: Rng + ?Sized>(
        &self,
        activity_score: f64,
        level: u32,
        reset: bool,
        first_activity: bool,
        rng: &mut R,
    ) -> u64 {
        if !self.message_pays(rng) {
            return 0;
        }
        let base = to_units((activity_score * level as f64 * self.message_factor).floor());
        if reset || first_activity {
            base.saturating_mul(self.reset_multiplier)
        } else {
            base
        }
    }

    fn message_pays<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if self.message_outcomes == 0 {
            return false;
        }
        rng.gen_range(1..=self.message_outcomes) <= self.message_wins
    }
}

/// Clamp a non-negative float into whole currency units.
fn to_units(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // `as` saturates at u64::MAX
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn work_range_default_factors() {
        let engine = RewardEngine::default();
        assert_eq!(engine.work_range(100.0, 1), (1500, 2000));
        assert_eq!(engine.work_range(100.5, 2), (3015, 4020));
    }

    #[test]
    fn work_income_within_range() {
        let engine = RewardEngine::default();
        let mut r = rng(1);
        for _ in 0..500 {
            let income = engine.work_income(100.0, 3, 1.0, &mut r);
            assert!((4500..=6000).contains(&income), "{income}");
        }
    }

    #[test]
    fn work_income_applies_fortune() {
        let engine = RewardEngine {
            work_min_factor: 10.0,
            work_max_factor: 10.0,
            ..RewardEngine::default()
        };
        assert_eq!(engine.work_income(100.0, 1, 1.5, &mut rng(2)), 1500);
        assert_eq!(engine.work_income(100.0, 1, 0.8, &mut rng(2)), 800);
        // truncation, not rounding
        assert_eq!(engine.work_income(100.0, 1, 0.9999, &mut rng(2)), 999);
    }

    #[test]
    fn work_income_bad_fortune_pays_nothing() {
        let engine = RewardEngine::default();
        assert_eq!(engine.work_income(100.0, 1, -1.0, &mut rng(3)), 0);
        assert_eq!(engine.work_income(100.0, 1, f64::NAN, &mut rng(3)), 0);
    }

    #[test]
    fn work_income_draws_fresh_values() {
        let engine = RewardEngine::default();
        let mut r = rng(4);
        let draws: std::collections::HashSet<u64> =
            (0..50).map(|_| engine.work_income(100.0, 5, 1.0, &mut r)).collect();
        assert!(draws.len() > 1);
    }

    #[test]
    fn message_income_is_zero_or_base() {
        let engine = RewardEngine::default();
        let mut r = rng(5);
        let mut wins = 0;
        for _ in 0..2000 {
            let income = engine.message_income(100.37, 2, false, false, &mut r);
            assert!(income == 0 || income == 2007, "{income}");
            if income > 0 {
                wins += 1;
            }
        }
        // 30% expected; generous bounds
        assert!((400..=800).contains(&wins), "wins {wins}");
    }

    #[test]
    fn message_income_reset_bonus() {
        let engine = RewardEngine {
            message_wins: 10,
            message_outcomes: 10,
            ..RewardEngine::default()
        };
        let mut r = rng(6);
        assert_eq!(engine.message_income(100.0, 1, false, false, &mut r), 1000);
        assert_eq!(engine.message_income(100.0, 1, true, false, &mut r), 10_000);
        assert_eq!(engine.message_income(100.0, 1, false, true, &mut r), 10_000);
    }

    #[test]
    fn message_income_never_pays_with_zero_wins() {
        let engine = RewardEngine {
            message_wins: 0,
            ..RewardEngine::default()
        };
        let mut r = rng(7);
        assert!((0..200).all(|_| engine.message_income(500.0, 9, true, true, &mut r) == 0));
    }

    #[test]
    fn zero_outcomes_never_pays() {
        let engine = RewardEngine {
            message_outcomes: 0,
            ..RewardEngine::default()
        };
        assert_eq!(engine.message_income(100.0, 1, false, false, &mut rng(8)), 0);
    }
}
