//! Fortune of the day.
//!
//! Each participant draws one fortune per UTC day. The draw is a BLAKE3
//! hash of the participant id and the date, so it is stable for the whole
//! day and needs no storage.

use chrono::{Datelike, NaiveDate};

use orbis_core::{AccountId, FortuneSource};

const DOMAIN_TAG: &[u8] = b"orbis/fortune/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fortune {
    GreatBlessing,
    Blessing,
    MiddleBlessing,
    SmallBlessing,
    FutureBlessing,
    Curse,
}

impl Fortune {
    /// Draw table, best to worst, with weights out of [`TOTAL_WEIGHT`].
    const TABLE: [(Fortune, u64); 6] = [
        (Fortune::GreatBlessing, 10),
        (Fortune::Blessing, 20),
        (Fortune::MiddleBlessing, 20),
        (Fortune::SmallBlessing, 25),
        (Fortune::FutureBlessing, 15),
        (Fortune::Curse, 10),
    ];

    pub fn income_multiplier(&self) -> f64 {
        match self {
            Self::GreatBlessing => 1.5,
            Self::Blessing => 1.2,
            Self::MiddleBlessing => 1.1,
            Self::SmallBlessing => 1.0,
            Self::FutureBlessing => 0.9,
            Self::Curse => 0.8,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::GreatBlessing => "Great Blessing",
            Self::Blessing => "Blessing",
            Self::MiddleBlessing => "Middle Blessing",
            Self::SmallBlessing => "Small Blessing",
            Self::FutureBlessing => "Future Blessing",
            Self::Curse => "Curse",
        }
    }

    fn from_roll(roll: u64) -> Self {
        let mut acc = 0;
        for (fortune, weight) in Self::TABLE {
            acc += weight;
            if roll < acc {
                return fortune;
            }
        }
        Self::Curse
    }
}

const TOTAL_WEIGHT: u64 = 100;

/// Deterministic per-day fortune derived from `(id, date)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyFortune;

impl DailyFortune {
    pub fn new() -> Self {
        Self
    }

    pub fn fortune(&self, id: &AccountId, day: NaiveDate) -> Fortune {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN_TAG);
        hasher.update(&(id.as_bytes().len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
        hasher.update(&day.num_days_from_ce().to_le_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        Fortune::from_roll(u64::from_le_bytes(head) % TOTAL_WEIGHT)
    }
}

impl FortuneSource for DailyFortune {
    fn income_multiplier(&self, id: &AccountId, day: NaiveDate) -> f64 {
        self.fortune(id, day).income_multiplier()
    }
}
