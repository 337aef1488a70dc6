//! Minimum interval between work invocations.
//!
//! The guard is a pure check. Recording `now` as the new last-work time
//! happens in the same versioned update that pays the income, so two racing
//! calls cannot both pass the check and both commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orbis_core::constants::WORK_COOLDOWN_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Allowed,
    /// Whole seconds left, rounded up.
    Blocked { remaining_secs: u64 },
}

impl CooldownStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Split a wait into `(minutes, seconds)` for display.
pub fn minutes_seconds(secs: u64) -> (u64, u64) {
    (secs / 60, secs % 60)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CooldownGuard {
    pub window_secs: u64,
}

impl Default for CooldownGuard {
    fn default() -> Self {
        Self {
            window_secs: WORK_COOLDOWN_SECS,
        }
    }
}

impl CooldownGuard {
    pub fn new(window_secs: u64) -> Self {
        Self { window_secs }
    }

    /// Blocked when `last` is present and less than the window has elapsed.
    ///
    /// A `last` in the future counts as zero elapsed time.
    pub fn check(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CooldownStatus {
        let Some(last) = last else {
            return CooldownStatus::Allowed;
        };

        let window_ms = (self.window_secs as i64).saturating_mul(1000);
        let elapsed_ms = (now - last).num_milliseconds().max(0);
        if elapsed_ms >= window_ms {
            return CooldownStatus::Allowed;
        }

        let remaining_ms = (window_ms - elapsed_ms) as u64;
        CooldownStatus::Blocked {
            remaining_secs: remaining_ms.div_ceil(1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn never_worked_is_allowed() {
        assert_eq!(CooldownGuard::default().check(None, now()), CooldownStatus::Allowed);
    }

    #[test]
    fn blocked_within_window() {
        let status = CooldownGuard::default().check(Some(now() - Duration::seconds(1000)), now());
        assert_eq!(status, CooldownStatus::Blocked { remaining_secs: 2600 });
    }

    #[test]
    fn allowed_after_window() {
        let status = CooldownGuard::default().check(Some(now() - Duration::seconds(4000)), now());
        assert_eq!(status, CooldownStatus::Allowed);
    }

    #[test]
    fn allowed_exactly_at_window() {
        let status = CooldownGuard::default().check(Some(now() - Duration::seconds(3600)), now());
        assert!(status.is_allowed());
    }

    #[test]
    fn remaining_rounds_up() {
        let last = now() - Duration::milliseconds(1_000_500);
        let status = CooldownGuard::default().check(Some(last), now());
        // 2_599_500ms left
        assert_eq!(status, CooldownStatus::Blocked { remaining_secs: 2600 });
    }

    #[test]
    fn future_last_time_blocks_full_window() {
        let status = CooldownGuard::default().check(Some(now() + Duration::seconds(30)), now());
        assert_eq!(status, CooldownStatus::Blocked { remaining_secs: 3600 });
    }

    #[test]
    fn zero_window_always_allows() {
        let guard = CooldownGuard::new(0);
        assert!(guard.check(Some(now()), now()).is_allowed());
    }

    #[test]
    fn display_split() {
        assert_eq!(minutes_seconds(2600), (43, 20));
        assert_eq!(minutes_seconds(59), (0, 59));
    }

    proptest! {
        #[test]
        fn remaining_never_exceeds_window(elapsed in 0i64..7200) {
            let guard = CooldownGuard::default();
            match guard.check(Some(now() - Duration::seconds(elapsed)), now()) {
                CooldownStatus::Allowed => prop_assert!(elapsed >= 3600),
                CooldownStatus::Blocked { remaining_secs } => {
                    prop_assert!(elapsed < 3600);
                    prop_assert_eq!(remaining_secs, (3600 - elapsed) as u64);
                }
            }
        }
    }
}
