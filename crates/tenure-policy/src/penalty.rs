//! Tiered early-exit penalty schedule.
//!
//! The further a position is from maturity, the steeper the rate:
//!
//! | remaining until unlock | rate |
//! |------------------------|------|
//! | [0, 30d)               |  5%  |
//! | [30d, 60d)             | 10%  |
//! | [60d, 90d)             | 15%  |
//! | [90d, ∞)               | 20%  |
//!
//! Tier boundaries are half-open on the right; the penalty on a withdrawal
//! is `floor(amount * rate_bps / 10_000)`.

use tenure_core::constants::{
    BPS_DENOMINATOR, PENALTY_RATE_TIER_1_BPS, PENALTY_RATE_TIER_2_BPS, PENALTY_RATE_TIER_3_BPS,
    PENALTY_RATE_TIER_4_BPS, PENALTY_TIER_1_SECS, PENALTY_TIER_2_SECS, PENALTY_TIER_3_SECS,
};
use tenure_core::types::{Balance, RateBps};

/// Penalty rate for a position with `remaining_secs` until unlock.
///
/// Callers reject expired positions before computing penalties, so a
/// non-positive remainder never reaches this function in a correct caller;
/// it still resolves to the lowest tier rather than panicking.
pub fn penalty_rate_bps(remaining_secs: i64) -> RateBps {
    if remaining_secs < PENALTY_TIER_1_SECS {
        PENALTY_RATE_TIER_1_BPS
    } else if remaining_secs < PENALTY_TIER_2_SECS {
        PENALTY_RATE_TIER_2_BPS
    } else if remaining_secs < PENALTY_TIER_3_SECS {
        PENALTY_RATE_TIER_3_BPS
    } else {
        PENALTY_RATE_TIER_4_BPS
    }
}

/// Penalty charged on withdrawing `amount` with `remaining_secs` left.
pub fn penalty_amount(remaining_secs: i64, amount: Balance) -> Balance {
    amount * penalty_rate_bps(remaining_secs) as Balance / BPS_DENOMINATOR
}

/// A request `r` guaranteed to satisfy `r + penalty(r) <= position_amount`.
///
/// The penalty is a flat rate on the requested amount, so this resolves to
/// `position_amount * (10_000 - rate) / 10_000`, floored.
pub fn max_urgent_withdraw(position_amount: Balance, remaining_secs: i64) -> Balance {
    let rate = penalty_rate_bps(remaining_secs) as Balance;
    position_amount * (BPS_DENOMINATOR - rate) / BPS_DENOMINATOR
}
