//! Activity score tracking.
//!
//! Each qualifying message nudges the score up by a small random amount.
//! An account idle for [`ACTIVITY_RESET_DAYS`] whole days or more first
//! falls back to [`ACTIVITY_FLOOR`] and the update is flagged as a reset,
//! which the reward engine turns into a bonus.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use orbis_core::constants::{
    ACTIVITY_BUMP_MAX, ACTIVITY_BUMP_MIN, ACTIVITY_FLOOR, ACTIVITY_RESET_DAYS, MIN_MESSAGE_CHARS,
};
use orbis_core::Participant;

/// Result of one activity update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityUpdate {
    /// New score, rounded to two decimals.
    pub activity_score: f64,
    /// Whether the previous score was discarded for inactivity.
    pub reset: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ActivityTracker {
    /// Score restored after inactivity.
    pub floor: f64,
    /// Day gap that triggers a reset.
    pub reset_after_days: i64,
    pub bump_min: f64,
    pub bump_max: f64,
    /// Messages with fewer non-whitespace characters are ignored.
    pub min_message_chars: usize,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self {
            floor: ACTIVITY_FLOOR,
            reset_after_days: ACTIVITY_RESET_DAYS,
            bump_min: ACTIVITY_BUMP_MIN,
            bump_max: ACTIVITY_BUMP_MAX,
            min_message_chars: MIN_MESSAGE_CHARS,
        }
    }
}

impl ActivityTracker {
    /// Whether a message should drive an activity update at all.
    pub fn qualifies(&self, author: &Participant, content: &str) -> bool {
        if author.automated {
            return false;
        }
        content.chars().filter(|c| !c.is_whitespace()).count() >= self.min_message_chars
    }

    /// Compute the next score from the previous state and today's date.
    ///
    /// A gap in the past shorter than `reset_after_days` (including a
    /// negative gap from clock skew) carries the score over unchanged.
    pub fn update<R: Rng + ?Sized>(
        &self,
        previous_score: f64,
        last_active: Option<NaiveDate>,
        today: NaiveDate,
        rng: &mut R,
    ) -> ActivityUpdate {
        let reset = match last_active {
            Some(last) => (today - last).num_days() >= self.reset_after_days,
            None => false,
        };
        let base = if reset { self.floor } else { previous_score };

        ActivityUpdate {
            activity_score: round2(base + self.bump(rng)),
            reset,
        }
    }

    /// Uniform draw from `[bump_min, bump_max]`, rounded to two decimals.
    fn bump<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = if self.bump_min <= self.bump_max {
            (self.bump_min, self.bump_max)
        } else {
            (self.bump_max, self.bump_min)
        };
        if lo == hi {
            return round2(lo);
        }
        round2(rng.gen_range(lo..=hi))
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
