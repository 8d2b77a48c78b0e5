//! tenure-policy
//!
//! Pure lock-term policy: the period table of allowed lock durations and
//! the tiered early-exit penalty schedule. No state, no clock reads —
//! callers supply timestamps and amounts.

pub mod penalty;
pub mod period;

pub use penalty::{max_urgent_withdraw, penalty_amount, penalty_rate_bps};
pub use period::PeriodTable;
