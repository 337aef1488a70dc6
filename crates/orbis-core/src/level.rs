//! Level curve: maps accumulated value to a level number.
//!
//! Level 2 is reached at [`LEVEL_BASE_THRESHOLD`] (500). Each following
//! threshold adds a gap that itself grows by [`LEVEL_INCREMENT_STEP`], so the
//! gaps run 150, 300, 450, 600, ... and thresholds 500, 650, 950, 1400, ...
//!
//! Because the gaps grow without bound, [`LevelCurve::level_for`] loops
//! O(sqrt(total)) times for any finite input.

use serde::{Deserialize, Serialize};

use crate::constants::{
    LEVEL_BASE_INCREMENT, LEVEL_BASE_THRESHOLD, LEVEL_INCREMENT_STEP, STARTING_LEVEL,
};

/// Growing-threshold level curve.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LevelCurve {
    /// Total needed to leave the starting level.
    pub base_threshold: f64,
    /// First gap between thresholds.
    pub base_increment: f64,
    /// Growth of each successive gap.
    pub increment_step: f64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base_threshold: LEVEL_BASE_THRESHOLD,
            base_increment: LEVEL_BASE_INCREMENT,
            increment_step: LEVEL_INCREMENT_STEP,
        }
    }
}

impl LevelCurve {
    /// Level reached by `total` (balance + activity score).
    ///
    /// Non-finite or negative totals map to the starting level. A curve
    /// whose gaps have stopped growing (both the current gap and
    /// `increment_step` non-positive) stops climbing there.
    ///
    /// # Examples
    ///
    /// ```
    /// use orbis_core::LevelCurve;
    /// let curve = LevelCurve::default();
    /// assert_eq!(curve.level_for(0.0), 1);
    /// assert_eq!(curve.level_for(500.0), 2);
    /// assert_eq!(curve.level_for(1149.0), 3);
    /// ```
    pub fn level_for(&self, total: f64) -> u32 {
        if !total.is_finite() || total < self.base_threshold {
            return STARTING_LEVEL;
        }

        let mut level = STARTING_LEVEL;
        let mut threshold = self.base_threshold;
        let mut increment = self.base_increment;

        while total >= threshold {
            level = level.saturating_add(1);
            threshold += increment;
            increment += self.increment_step;
            // Gaps that can no longer grow would never let the loop exit.
            if level == u32::MAX || (increment <= 0.0 && self.increment_step <= 0.0) {
                break;
            }
        }

        level
    }

    /// Minimum total that reaches `level`.
    ///
    /// Returns `0.0` for the starting level and below.
    pub fn threshold_for(&self, level: u32) -> f64 {
        if level <= STARTING_LEVEL {
            return 0.0;
        }

        let mut threshold = self.base_threshold;
        let mut increment = self.base_increment;
        for _ in (STARTING_LEVEL + 1)..level {
            threshold += increment;
            increment += self.increment_step;
        }
        threshold
    }
}
