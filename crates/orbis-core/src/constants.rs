//! Economy constants. All currency values are whole units.
//!
//! These are the defaults baked into each component's configuration.
//! Components never read them directly at runtime; they are copied into
//! the serde-loadable config structs so deployments and tests can override
//! any of them.

// --- Level curve ---

/// Every account starts at this level.
pub const STARTING_LEVEL: u32 = 1;

/// Total (balance + activity) needed to reach level 2.
pub const LEVEL_BASE_THRESHOLD: f64 = 500.0;

/// Gap between the level 2 and level 3 thresholds.
pub const LEVEL_BASE_INCREMENT: f64 = 150.0;

/// Amount each successive gap grows by (gaps run 150, 300, 450, ...).
pub const LEVEL_INCREMENT_STEP: f64 = 150.0;

// --- Activity ---

/// Activity score assigned to new accounts and restored after inactivity.
pub const ACTIVITY_FLOOR: f64 = 100.0;

/// Whole days without a qualifying message before the score resets.
pub const ACTIVITY_RESET_DAYS: i64 = 2;

/// Lower bound of the per-message activity increment.
pub const ACTIVITY_BUMP_MIN: f64 = 0.5;

/// Upper bound of the per-message activity increment.
pub const ACTIVITY_BUMP_MAX: f64 = 1.0;

/// Minimum non-whitespace characters for a message to count.
pub const MIN_MESSAGE_CHARS: usize = 5;

// --- Work action ---

/// Minimum interval between two `work` invocations, in seconds.
pub const WORK_COOLDOWN_SECS: u64 = 3600;

/// Lower income factor: `activity * level * WORK_MIN_FACTOR`.
pub const WORK_MIN_FACTOR: f64 = 15.0;

/// Upper income factor: `activity * level * WORK_MAX_FACTOR`.
pub const WORK_MAX_FACTOR: f64 = 20.0;

/// Fortune multiplier used when no fortune source is configured.
pub const NEUTRAL_FORTUNE: f64 = 1.0;

// --- Message rewards ---

/// Income factor for a rewarded message: `activity * level * MESSAGE_FACTOR`.
pub const MESSAGE_FACTOR: f64 = 10.0;

/// Winning outcomes out of [`MESSAGE_REWARD_OUTCOMES`].
pub const MESSAGE_REWARD_WINS: u32 = 3;

/// Size of the uniform draw deciding whether a message pays out.
pub const MESSAGE_REWARD_OUTCOMES: u32 = 10;

/// Multiplier for the first message after a reset (or ever).
pub const RESET_DAY_MULTIPLIER: u64 = 10;

// --- Ranking ---

/// Accounts per leaderboard page.
pub const RANK_PAGE_SIZE: usize = 30;

// --- Store ---

/// Attempts for one read-modify-write before a conflict is surfaced.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound on waiting for an account lock, in milliseconds.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2_000;
