use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, Timestamp};

// ── Position ─────────────────────────────────────────────────────────────────

/// One lock: an amount deposited at `start` for `period` seconds.
///
/// Positions are never deleted. A withdrawn position remains in its slot as
/// a tombstone (`withdrawn = true`) so the index stays stable for audit and
/// the slot becomes eligible for reuse by a later stake.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Remaining tracked amount in base units. Urgent withdrawals reduce it.
    pub amount: Balance,
    /// Timestamp the position became active (creation or last extension).
    pub start: Timestamp,
    /// Configured lock duration in seconds, drawn from the period table.
    pub period: i64,
    /// Tombstone flag; a withdrawn slot may be reused.
    pub withdrawn: bool,
    /// One-shot urgent-withdraw latch, scoped to the current epoch.
    /// Cleared on extension; irrelevant once withdrawn.
    pub urgent_used: bool,
    /// Sum of penalties charged against this position (audit only).
    #[serde(default)]
    pub penalties_paid: Balance,
}

impl Position {
    pub fn new(amount: Balance, start: Timestamp, period: i64) -> Self {
        Self {
            amount,
            start,
            period,
            withdrawn: false,
            urgent_used: false,
            penalties_paid: 0,
        }
    }

    /// Timestamp at which the lock matures.
    pub fn unlocks_at(&self) -> Timestamp {
        self.start + self.period
    }

    /// True once the lock has matured and still holds a live balance claim.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !self.withdrawn && now >= self.unlocks_at()
    }

    /// Seconds until maturity; zero once matured.
    pub fn remaining(&self, now: Timestamp) -> i64 {
        (self.unlocks_at() - now).max(0)
    }
}

// ── StakeAccount ─────────────────────────────────────────────────────────────

/// Per-account position book as stored in the state DB.
///
/// `active` counts slots with `withdrawn == false` and is maintained by the
/// ledger's transition functions; it bounds how many positions an account
/// may hold simultaneously.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StakeAccount {
    pub account_id: AccountId,
    pub positions: Vec<Position>,
    pub active: u32,
    /// Lifetime units staked through this account (audit only).
    #[serde(default)]
    pub total_staked: Balance,
    /// Lifetime units returned to this account (audit only).
    #[serde(default)]
    pub total_withdrawn: Balance,
}

impl StakeAccount {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            positions: Vec::new(),
            active: 0,
            total_staked: 0,
            total_withdrawn: 0,
        }
    }

    /// Lowest-index tombstoned slot, if any.
    pub fn free_slot(&self) -> Option<usize> {
        self.positions.iter().position(|p| p.withdrawn)
    }

    /// True if any live position has matured without being withdrawn.
    pub fn has_unresolved_expired(&self, now: Timestamp) -> bool {
        self.positions.iter().any(|p| p.is_expired(now))
    }
}

// ── ParticipantRecord ────────────────────────────────────────────────────────

/// Threshold-gate participation record for one account.
///
/// `has_purchased` distinguishes "never purchased" from a legitimate
/// purchase on day 0; the day index alone cannot carry both meanings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub last_purchase_day: u64,
    pub has_purchased: bool,
    /// Total collectibles minted by this account over the campaign.
    #[serde(default)]
    pub mint_count: u32,
}

impl ParticipantRecord {
    pub fn purchased_on(&self, day: u64) -> bool {
        self.has_purchased && self.last_purchase_day == day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct() -> AccountId {
        AccountId::from_label("book-owner")
    }

    #[test]
    fn expiry_is_inclusive_of_unlock_instant() {
        let p = Position::new(1_000, 100, 50);
        assert_eq!(p.unlocks_at(), 150);
        assert!(!p.is_expired(149));
        assert!(p.is_expired(150));
    }

    #[test]
    fn tombstone_is_never_expired() {
        let mut p = Position::new(1_000, 0, 10);
        p.withdrawn = true;
        assert!(!p.is_expired(1_000_000));
    }

    #[test]
    fn remaining_clamps_at_zero() {
        let p = Position::new(1, 0, 100);
        assert_eq!(p.remaining(40), 60);
        assert_eq!(p.remaining(100), 0);
        assert_eq!(p.remaining(500), 0);
    }

    #[test]
    fn free_slot_prefers_lowest_index() {
        let mut book = StakeAccount::new(acct());
        book.positions.push(Position::new(1, 0, 10));
        let mut dead = Position::new(2, 0, 10);
        dead.withdrawn = true;
        book.positions.push(dead.clone());
        book.positions.push(dead);
        assert_eq!(book.free_slot(), Some(1));
    }

    #[test]
    fn participant_day_zero_is_not_conflated_with_never() {
        let fresh = ParticipantRecord::default();
        assert!(!fresh.purchased_on(0));

        let day0 = ParticipantRecord { last_purchase_day: 0, has_purchased: true, mint_count: 1 };
        assert!(day0.purchased_on(0));
        assert!(!day0.purchased_on(1));
    }
}
