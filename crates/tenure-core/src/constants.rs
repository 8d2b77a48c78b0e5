//! Tenure protocol constants.
//!
//! Base unit: 1 TNR = 1,000,000 units (6 decimals).
//! All durations are seconds, all timestamps Unix UTC seconds.

// ── Asset scale ──────────────────────────────────────────────────────────────

/// 1 TNR expressed in base units.
pub const UNITS_PER_TNR: u128 = 1_000_000;

/// Minimum amount accepted by `stake`, in base units (one whole TNR).
pub const MIN_STAKE_UNITS: u128 = 1_000_000;

// ── Time ─────────────────────────────────────────────────────────────────────

pub const SECONDS_PER_DAY: i64 = 86_400;

// ── Staking ──────────────────────────────────────────────────────────────────

/// Default cap on simultaneously active positions per account.
/// A cap of 1 degenerates to a single-slot-per-account ledger.
pub const DEFAULT_MAX_ACTIVE_POSITIONS: u32 = 10;

// ── Penalty schedule ─────────────────────────────────────────────────────────

/// Basis-point denominator (10_000 = 100%).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Tier boundaries on time remaining until unlock, half-open on the right:
/// [0, 30d) → 5%,  [30d, 60d) → 10%,  [60d, 90d) → 15%,  [90d, ∞) → 20%.
pub const PENALTY_TIER_1_SECS: i64 = 30 * SECONDS_PER_DAY;
pub const PENALTY_TIER_2_SECS: i64 = 60 * SECONDS_PER_DAY;
pub const PENALTY_TIER_3_SECS: i64 = 90 * SECONDS_PER_DAY;

pub const PENALTY_RATE_TIER_1_BPS: u32 = 500;
pub const PENALTY_RATE_TIER_2_BPS: u32 = 1_000;
pub const PENALTY_RATE_TIER_3_BPS: u32 = 1_500;
pub const PENALTY_RATE_TIER_4_BPS: u32 = 2_000;
