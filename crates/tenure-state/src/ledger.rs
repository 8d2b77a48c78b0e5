use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tenure_core::asset::AssetLedger;
use tenure_core::constants::MIN_STAKE_UNITS;
use tenure_core::error::TenureError;
use tenure_core::events::{Extended, PenaltiesSwept, Staked, UrgentWithdrawn, Withdrawn};
use tenure_core::position::{Position, StakeAccount};
use tenure_core::types::{AccountId, Balance, PositionId, Timestamp};
use tenure_policy::{max_urgent_withdraw, penalty_amount, PeriodTable};
use tracing::info;

use crate::db::StateDb;
use crate::guard::EntryGuard;

const KEY_PENALTY_POOL: &str = "penalty_pool";
const KEY_TOTAL_STAKED: &str = "ledger_total_staked";
const KEY_TOTAL_PENALTIES: &str = "ledger_total_penalties";
const KEY_PAUSED: &str = "ledger_paused";

/// The staking ledger transition engine.
///
/// Owns per-account position books, enforces the lock lifecycle, and
/// accumulates early-exit penalties into a pool claimable by the admin.
/// Each transition is atomic: validate against the current records,
/// commit the new records, then make the external asset call last; if
/// that call fails, the prior records are written back before the error
/// propagates, so callers observe all-or-nothing semantics.
pub struct StakingLedger<A: AssetLedger> {
    db: Arc<StateDb>,
    asset: A,
    periods: PeriodTable,
    admin: AccountId,
    /// Asset-ledger account that holds all locked funds and the penalty pool.
    vault: AccountId,
    max_active_positions: u32,
    busy: AtomicBool,
}

impl<A: AssetLedger> StakingLedger<A> {
    pub fn new(
        db: Arc<StateDb>,
        asset: A,
        periods: PeriodTable,
        admin: AccountId,
        vault: AccountId,
        max_active_positions: u32,
    ) -> Self {
        Self { db, asset, periods, admin, vault, max_active_positions, busy: AtomicBool::new(false) }
    }

    pub fn vault(&self) -> &AccountId {
        &self.vault
    }

    pub fn periods(&self) -> &PeriodTable {
        &self.periods
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Open a new position for `caller`, pulling `amount` from their asset
    /// balance. Reuses the lowest tombstoned slot when one exists; an
    /// expired-but-unwithdrawn position anywhere on the account blocks new
    /// stakes until it is resolved.
    pub fn stake(
        &self,
        caller: &AccountId,
        amount: Balance,
        period_index: usize,
        now: Timestamp,
    ) -> Result<Staked, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_not_paused()?;

        if amount == 0 {
            return Err(TenureError::ZeroAmount);
        }
        if amount < MIN_STAKE_UNITS {
            return Err(TenureError::StakeAmountTooSmall { min: MIN_STAKE_UNITS });
        }
        let period = self.periods.duration(period_index)?;

        let prior = self.db.get_stake_account(caller)?;
        let mut book = prior.clone().unwrap_or_else(|| StakeAccount::new(caller.clone()));

        if book.has_unresolved_expired(now) {
            return Err(TenureError::PreviousStakeUnresolved);
        }

        let (slot, new_slot) = match book.free_slot() {
            Some(i) => (i, false),
            None => {
                if book.active >= self.max_active_positions {
                    return Err(TenureError::MaxPositionsReached {
                        max: self.max_active_positions,
                    });
                }
                book.positions.push(Position::new(0, now, period));
                (book.positions.len() - 1, true)
            }
        };

        let position = Position::new(amount, now, period);
        let unlocks_at = position.unlocks_at();
        book.positions[slot] = position;
        book.active += 1;
        book.total_staked += amount;

        let prior_total = self.db.get_meta_u128(KEY_TOTAL_STAKED)?;
        self.db.put_stake_account(&book)?;
        self.db.put_meta_u128(KEY_TOTAL_STAKED, prior_total + amount)?;

        // External pull is the last side effect of the transition.
        if let Err(e) = self.asset.transfer_from(&self.vault, caller, &self.vault, amount) {
            self.db.restore_stake_account(caller, prior.as_ref())?;
            self.db.put_meta_u128(KEY_TOTAL_STAKED, prior_total)?;
            return Err(e);
        }

        let event = Staked {
            account: caller.clone(),
            position_id: PositionId(slot as u32),
            new_slot,
            amount,
            period,
            start: now,
            unlocks_at,
        };
        info!(
            account = %event.account,
            position = %event.position_id,
            amount,
            period,
            unlocks_at,
            "staked"
        );
        Ok(event)
    }

    /// Ordinary withdrawal of a matured position. Never blocked by pause —
    /// users must always be able to exit.
    pub fn withdraw(
        &self,
        caller: &AccountId,
        position_id: PositionId,
        now: Timestamp,
    ) -> Result<Withdrawn, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;

        let prior = self.db.get_stake_account(caller)?;
        let mut book = prior.clone().ok_or_else(|| self.not_found(caller, position_id))?;
        let slot = position_id.0 as usize;
        let position = book
            .positions
            .get_mut(slot)
            .ok_or_else(|| self.not_found(caller, position_id))?;

        if position.withdrawn {
            return Err(TenureError::AlreadyWithdrawn);
        }
        let unlocks_at = position.unlocks_at();
        if now < unlocks_at {
            return Err(TenureError::NotExpired { unlocks_at });
        }

        let amount = position.amount;
        position.withdrawn = true;
        position.urgent_used = false;
        book.active -= 1;
        book.total_withdrawn += amount;

        let prior_total = self.db.get_meta_u128(KEY_TOTAL_STAKED)?;
        self.db.put_stake_account(&book)?;
        self.db.put_meta_u128(KEY_TOTAL_STAKED, prior_total - amount)?;

        if let Err(e) = self.asset.transfer(&self.vault, caller, amount) {
            self.db.restore_stake_account(caller, prior.as_ref())?;
            self.db.put_meta_u128(KEY_TOTAL_STAKED, prior_total)?;
            return Err(e);
        }

        info!(account = %caller, position = %position_id, amount, "withdrawn");
        Ok(Withdrawn { account: caller.clone(), position_id, amount, timestamp: now })
    }

    /// Roll an expired position over into a fresh lock on the same balance.
    pub fn extend(
        &self,
        caller: &AccountId,
        position_id: PositionId,
        period_index: usize,
        now: Timestamp,
    ) -> Result<Extended, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_not_paused()?;

        let period = self.periods.duration(period_index)?;

        let mut book = self
            .db
            .get_stake_account(caller)?
            .ok_or_else(|| self.not_found(caller, position_id))?;
        let slot = position_id.0 as usize;
        let position = book
            .positions
            .get_mut(slot)
            .ok_or_else(|| self.not_found(caller, position_id))?;

        if position.withdrawn {
            return Err(TenureError::AlreadyWithdrawn);
        }
        let unlocks_at = position.unlocks_at();
        if now < unlocks_at {
            return Err(TenureError::NotExpired { unlocks_at });
        }

        position.start = now;
        position.period = period;
        position.urgent_used = false;
        let amount = position.amount;
        let unlocks_at = position.unlocks_at();
        self.db.put_stake_account(&book)?;

        info!(account = %caller, position = %position_id, period, unlocks_at, "extended");
        Ok(Extended {
            account: caller.clone(),
            position_id,
            amount,
            period,
            start: now,
            unlocks_at,
        })
    }

    /// Early exit before maturity. Charges the tiered penalty on the
    /// requested amount, credits it to the penalty pool, and sets the
    /// one-shot latch for this position epoch.
    pub fn urgent_withdraw(
        &self,
        caller: &AccountId,
        position_id: PositionId,
        amount_to_receive: Balance,
        now: Timestamp,
    ) -> Result<UrgentWithdrawn, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;

        if amount_to_receive == 0 {
            return Err(TenureError::ZeroAmount);
        }

        let prior = self.db.get_stake_account(caller)?;
        let mut book = prior.clone().ok_or_else(|| self.not_found(caller, position_id))?;
        let slot = position_id.0 as usize;
        let position = book
            .positions
            .get_mut(slot)
            .ok_or_else(|| self.not_found(caller, position_id))?;

        if position.withdrawn {
            return Err(TenureError::AlreadyWithdrawn);
        }
        if now >= position.unlocks_at() {
            return Err(TenureError::AlreadyExpired);
        }
        if position.urgent_used {
            return Err(TenureError::UrgentAlreadyUsed);
        }

        let remaining = position.unlocks_at() - now;
        let penalty = penalty_amount(remaining, amount_to_receive);
        let need = amount_to_receive + penalty;
        if need > position.amount {
            return Err(TenureError::AmountPlusPenaltyExceedsBalance {
                need,
                have: position.amount,
            });
        }

        position.amount -= need;
        position.penalties_paid += penalty;
        position.urgent_used = true;
        book.total_withdrawn += amount_to_receive;

        let prior_pool = self.db.get_meta_u128(KEY_PENALTY_POOL)?;
        let prior_total = self.db.get_meta_u128(KEY_TOTAL_STAKED)?;
        let prior_collected = self.db.get_meta_u128(KEY_TOTAL_PENALTIES)?;
        self.db.put_stake_account(&book)?;
        self.db.put_meta_u128(KEY_PENALTY_POOL, prior_pool + penalty)?;
        self.db.put_meta_u128(KEY_TOTAL_STAKED, prior_total - need)?;
        self.db.put_meta_u128(KEY_TOTAL_PENALTIES, prior_collected + penalty)?;

        if let Err(e) = self.asset.transfer(&self.vault, caller, amount_to_receive) {
            self.db.restore_stake_account(caller, prior.as_ref())?;
            self.db.put_meta_u128(KEY_PENALTY_POOL, prior_pool)?;
            self.db.put_meta_u128(KEY_TOTAL_STAKED, prior_total)?;
            self.db.put_meta_u128(KEY_TOTAL_PENALTIES, prior_collected)?;
            return Err(e);
        }

        info!(
            account = %caller,
            position = %position_id,
            amount = amount_to_receive,
            penalty,
            "urgent withdrawal"
        );
        Ok(UrgentWithdrawn {
            account: caller.clone(),
            position_id,
            amount: amount_to_receive,
            penalty,
            timestamp: now,
        })
    }

    /// Transfer the entire penalty pool to the admin. Partial sweeps are
    /// not supported; an empty pool is an error.
    pub fn sweep_penalties(
        &self,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<PenaltiesSwept, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_admin(caller)?;

        let pool = self.db.get_meta_u128(KEY_PENALTY_POOL)?;
        if pool == 0 {
            return Err(TenureError::PenaltyPoolEmpty);
        }
        self.db.put_meta_u128(KEY_PENALTY_POOL, 0)?;

        if let Err(e) = self.asset.transfer(&self.vault, &self.admin, pool) {
            self.db.put_meta_u128(KEY_PENALTY_POOL, pool)?;
            return Err(e);
        }

        info!(admin = %caller, amount = pool, "penalty pool swept");
        Ok(PenaltiesSwept { admin: caller.clone(), amount: pool, timestamp: now })
    }

    /// Pause gates `stake` and `extend`; the withdrawal paths stay open.
    pub fn set_paused(&self, caller: &AccountId, paused: bool) -> Result<(), TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_admin(caller)?;
        self.db.put_meta_bool(KEY_PAUSED, paused)
    }

    // ── Views ────────────────────────────────────────────────────────────────

    pub fn positions(&self, account: &AccountId) -> Result<Vec<Position>, TenureError> {
        Ok(self
            .db
            .get_stake_account(account)?
            .map(|b| b.positions)
            .unwrap_or_default())
    }

    pub fn stake_account(&self, account: &AccountId) -> Result<Option<StakeAccount>, TenureError> {
        self.db.get_stake_account(account)
    }

    /// Largest amount `account` could request via `urgent_withdraw` on the
    /// given position right now.
    pub fn max_urgent_withdraw(
        &self,
        account: &AccountId,
        position_id: PositionId,
        now: Timestamp,
    ) -> Result<Balance, TenureError> {
        let book = self
            .db
            .get_stake_account(account)?
            .ok_or_else(|| self.not_found(account, position_id))?;
        let position = book
            .positions
            .get(position_id.0 as usize)
            .ok_or_else(|| self.not_found(account, position_id))?;
        if position.withdrawn {
            return Err(TenureError::AlreadyWithdrawn);
        }
        if now >= position.unlocks_at() {
            return Err(TenureError::AlreadyExpired);
        }
        Ok(max_urgent_withdraw(position.amount, position.unlocks_at() - now))
    }

    pub fn penalty_pool(&self) -> Result<Balance, TenureError> {
        self.db.get_meta_u128(KEY_PENALTY_POOL)
    }

    /// Units currently locked across all accounts (excludes the pool).
    pub fn total_staked(&self) -> Result<Balance, TenureError> {
        self.db.get_meta_u128(KEY_TOTAL_STAKED)
    }

    /// Lifetime penalties charged, including already-swept amounts.
    pub fn total_penalties_collected(&self) -> Result<Balance, TenureError> {
        self.db.get_meta_u128(KEY_TOTAL_PENALTIES)
    }

    pub fn is_paused(&self) -> Result<bool, TenureError> {
        self.db.get_meta_bool(KEY_PAUSED)
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn ensure_not_paused(&self) -> Result<(), TenureError> {
        if self.db.get_meta_bool(KEY_PAUSED)? {
            return Err(TenureError::Paused);
        }
        Ok(())
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), TenureError> {
        if caller != &self.admin {
            return Err(TenureError::Unauthorized);
        }
        Ok(())
    }

    fn not_found(&self, account: &AccountId, position_id: PositionId) -> TenureError {
        TenureError::PositionNotFound { account: account.to_b58(), id: position_id.0 }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
