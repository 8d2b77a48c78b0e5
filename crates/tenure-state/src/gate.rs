use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tenure_core::asset::{AssetLedger, CollectibleRegistry};
use tenure_core::campaign::CampaignSchedule;
use tenure_core::error::TenureError;
use tenure_core::events::{CampaignSwept, CollectibleMinted};
use tenure_core::position::ParticipantRecord;
use tenure_core::types::{AccountId, Balance, DayIndex, Timestamp};
use tracing::info;

use crate::db::StateDb;
use crate::guard::EntryGuard;

const KEY_PAUSED: &str = "gate_paused";

/// The threshold-gate transition engine.
///
/// Runs a day-indexed mint campaign: each day of the campaign window has a
/// required deposit and a participant capacity, and an account may mint at
/// most one collectible per day. Deposits accumulate in the vault until the
/// admin sweeps them out.
///
/// The mint transition commits its participation records first, then makes
/// the deposit pull and the registry mint; a failure in either external
/// step unwinds everything already done, so a caller never pays without
/// receiving a collectible.
pub struct ThresholdGate<A: AssetLedger, R: CollectibleRegistry> {
    db: Arc<StateDb>,
    asset: A,
    registry: R,
    schedule: CampaignSchedule,
    admin: AccountId,
    /// Asset-ledger account that accumulates campaign deposits.
    vault: AccountId,
    busy: AtomicBool,
}

impl<A: AssetLedger, R: CollectibleRegistry> ThresholdGate<A, R> {
    pub fn new(
        db: Arc<StateDb>,
        asset: A,
        registry: R,
        schedule: CampaignSchedule,
        admin: AccountId,
        vault: AccountId,
    ) -> Self {
        Self { db, asset, registry, schedule, admin, vault, busy: AtomicBool::new(false) }
    }

    pub fn schedule(&self) -> &CampaignSchedule {
        &self.schedule
    }

    pub fn vault(&self) -> &AccountId {
        &self.vault
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Mint today's collectible for `caller`, pulling the day's required
    /// deposit from their asset balance.
    pub fn mint(
        &self,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<CollectibleMinted, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_not_paused()?;

        let day = self.schedule.current_day(now).ok_or(TenureError::CampaignInactive)?;
        let required = self.schedule.required_deposit(day)?;
        let capacity = self.schedule.capacity(day)?;

        let prior_count = self.db.day_count(day)?;
        if prior_count >= capacity {
            return Err(TenureError::DailyCapacityReached { day });
        }

        let prior_record = self.db.get_participant(caller)?;
        let mut record = prior_record.clone().unwrap_or_default();
        if record.purchased_on(day) {
            return Err(TenureError::AlreadyPurchasedToday { day });
        }

        // Preflight the pull so a short balance fails before any mutation.
        let have = self.asset.balance_of(caller)?;
        if have < required {
            return Err(TenureError::InsufficientBalance { need: required, have });
        }
        let approved = self.asset.allowance(caller, &self.vault)?;
        if approved < required {
            return Err(TenureError::InsufficientAllowance { need: required, have: approved });
        }

        let token_id = self.registry.next_token_id()?;

        record.last_purchase_day = day;
        record.has_purchased = true;
        record.mint_count += 1;
        self.db.put_day_count(day, prior_count + 1)?;
        self.db.put_participant(caller, &record)?;

        if let Err(e) = self.asset.transfer_from(&self.vault, caller, &self.vault, required) {
            self.db.put_day_count(day, prior_count)?;
            self.db.restore_participant(caller, prior_record.as_ref())?;
            return Err(e);
        }
        if let Err(e) = self.registry.mint(caller, token_id) {
            // Refund the deposit, then unwind the records.
            self.asset.transfer(&self.vault, caller, required)?;
            self.db.put_day_count(day, prior_count)?;
            self.db.restore_participant(caller, prior_record.as_ref())?;
            return Err(e);
        }

        info!(account = %caller, token_id, day, amount = required, "collectible minted");
        Ok(CollectibleMinted {
            account: caller.clone(),
            token_id,
            amount: required,
            day,
            timestamp: now,
        })
    }

    /// Move `amount` of accumulated deposits out of the vault. Admin-only,
    /// bounded by what the vault actually holds.
    pub fn admin_withdraw(
        &self,
        caller: &AccountId,
        to: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<CampaignSwept, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_admin(caller)?;
        if amount == 0 {
            return Err(TenureError::ZeroAmount);
        }
        let have = self.asset.balance_of(&self.vault)?;
        if have < amount {
            return Err(TenureError::InsufficientBalance { need: amount, have });
        }
        self.asset.transfer(&self.vault, to, amount)?;
        info!(admin = %caller, to = %to, amount, "campaign deposits withdrawn");
        Ok(CampaignSwept { admin: caller.clone(), to: to.clone(), amount, timestamp: now })
    }

    /// Sweep the full vault balance. A no-op empty vault is an error so the
    /// admin learns nothing moved.
    pub fn admin_withdraw_all(
        &self,
        caller: &AccountId,
        to: &AccountId,
        now: Timestamp,
    ) -> Result<CampaignSwept, TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_admin(caller)?;
        let have = self.asset.balance_of(&self.vault)?;
        if have == 0 {
            return Err(TenureError::InsufficientBalance { need: 1, have: 0 });
        }
        self.asset.transfer(&self.vault, to, have)?;
        info!(admin = %caller, to = %to, amount = have, "campaign deposits withdrawn");
        Ok(CampaignSwept { admin: caller.clone(), to: to.clone(), amount: have, timestamp: now })
    }

    pub fn set_paused(&self, caller: &AccountId, paused: bool) -> Result<(), TenureError> {
        let _guard = EntryGuard::acquire(&self.busy)?;
        self.ensure_admin(caller)?;
        self.db.put_meta_bool(KEY_PAUSED, paused)
    }

    // ── Views ────────────────────────────────────────────────────────────────

    pub fn current_day(&self, now: Timestamp) -> Option<DayIndex> {
        self.schedule.current_day(now)
    }

    pub fn required_deposit(&self, day: DayIndex) -> Result<Balance, TenureError> {
        self.schedule.required_deposit(day)
    }

    /// Participant slots still open today, or zero outside the campaign.
    pub fn remaining_today(&self, now: Timestamp) -> Result<u64, TenureError> {
        let Some(day) = self.schedule.current_day(now) else {
            return Ok(0);
        };
        let capacity = self.schedule.capacity(day)?;
        Ok(capacity.saturating_sub(self.db.day_count(day)?))
    }

    pub fn minted_on(&self, day: DayIndex) -> Result<u64, TenureError> {
        self.db.day_count(day)
    }

    pub fn participant(
        &self,
        account: &AccountId,
    ) -> Result<Option<ParticipantRecord>, TenureError> {
        self.db.get_participant(account)
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
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::constants::SECONDS_PER_DAY;
    use crate::registry::Registry;
    use crate::token::TokenLedger;

    const DAY: i64 = SECONDS_PER_DAY;

    struct Harness {
        gate: ThresholdGate<TokenLedger, Registry>,
        token: TokenLedger,
        admin: AccountId,
        vault: AccountId,
    }

    /// Two-day campaign starting at t=1000: required [1000, 1100],
    /// capacity [2, 2].
    fn harness(name: &str) -> Harness {
        let dir = std::env::temp_dir().join(format!("tenure_gate_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = Arc::new(StateDb::open(&dir).expect("open temp db"));
        let admin = AccountId::from_label("admin");
        let vault = AccountId::from_label("campaign-vault");
        let token = TokenLedger::new(Arc::clone(&db), admin.clone());
        let schedule =
            CampaignSchedule::new(1_000, 2 * DAY, vec![1_000, 1_100], vec![2, 2]).unwrap();
        let gate = ThresholdGate::new(
            Arc::clone(&db),
            TokenLedger::new(Arc::clone(&db), admin.clone()),
            Registry::new(Arc::clone(&db)),
            schedule,
            admin.clone(),
            vault.clone(),
        );
        Harness { gate, token, admin, vault }
    }

    fn fund(h: &Harness, who: &AccountId, amount: Balance) {
        h.token.mint_supply(&h.admin, who, amount).unwrap();
        h.token.approve(who, &h.vault, amount).unwrap();
    }

    #[test]
    fn capacity_and_one_per_day() {
        let h = harness("capacity");
        let a = AccountId::from_label("a");
        let b = AccountId::from_label("b");
        let c = AccountId::from_label("c");
        for who in [&a, &b, &c] {
            fund(&h, who, 10_000);
        }

        let t0 = 1_000;
        let e1 = h.gate.mint(&a, t0).unwrap();
        assert_eq!((e1.token_id, e1.day, e1.amount), (1, 0, 1_000));
        let e2 = h.gate.mint(&b, t0 + 60).unwrap();
        assert_eq!(e2.token_id, 2);
        assert_eq!(h.gate.remaining_today(t0).unwrap(), 0);

        assert!(matches!(
            h.gate.mint(&c, t0 + 120).unwrap_err(),
            TenureError::DailyCapacityReached { day: 0 }
        ));
        assert!(matches!(
            h.gate.mint(&a, t0 + 180).unwrap_err(),
            TenureError::AlreadyPurchasedToday { day: 0 }
        ));

        // Next day the same account can mint again, at the higher price.
        let t1 = t0 + DAY;
        let e3 = h.gate.mint(&a, t1).unwrap();
        assert_eq!((e3.token_id, e3.day, e3.amount), (3, 1, 1_100));
        assert_eq!(h.token.balance_of(&h.vault).unwrap(), 1_000 + 1_000 + 1_100);
        assert_eq!(h.token.balance_of(&a).unwrap(), 10_000 - 1_000 - 1_100);
    }

    #[test]
    fn mint_outside_window_rejected() {
        let h = harness("window");
        let a = AccountId::from_label("a");
        fund(&h, &a, 10_000);
        assert!(matches!(h.gate.mint(&a, 999).unwrap_err(), TenureError::CampaignInactive));
        assert!(matches!(
            h.gate.mint(&a, 1_000 + 2 * DAY).unwrap_err(),
            TenureError::CampaignInactive
        ));
        assert_eq!(h.gate.remaining_today(999).unwrap(), 0);
    }

    #[test]
    fn short_balance_fails_before_any_mutation() {
        let h = harness("short_balance");
        let a = AccountId::from_label("a");
        h.token.mint_supply(&h.admin, &a, 999).unwrap();
        h.token.approve(&a, &h.vault, 10_000).unwrap();

        assert!(matches!(
            h.gate.mint(&a, 1_000).unwrap_err(),
            TenureError::InsufficientBalance { need: 1_000, have: 999 }
        ));
        assert_eq!(h.gate.minted_on(0).unwrap(), 0);
        assert!(h.gate.participant(&a).unwrap().is_none());
    }

    #[test]
    fn missing_allowance_fails_before_any_mutation() {
        let h = harness("no_allowance");
        let a = AccountId::from_label("a");
        h.token.mint_supply(&h.admin, &a, 10_000).unwrap();

        assert!(matches!(
            h.gate.mint(&a, 1_000).unwrap_err(),
            TenureError::InsufficientAllowance { need: 1_000, have: 0 }
        ));
        assert_eq!(h.gate.minted_on(0).unwrap(), 0);
    }

    #[test]
    fn paused_blocks_mint() {
        let h = harness("paused");
        let a = AccountId::from_label("a");
        fund(&h, &a, 10_000);

        assert!(matches!(h.gate.set_paused(&a, true).unwrap_err(), TenureError::Unauthorized));
        h.gate.set_paused(&h.admin, true).unwrap();
        assert!(matches!(h.gate.mint(&a, 1_000).unwrap_err(), TenureError::Paused));
        h.gate.set_paused(&h.admin, false).unwrap();
        h.gate.mint(&a, 1_000).unwrap();
    }

    #[test]
    fn admin_withdraw_bounded_by_vault() {
        let h = harness("sweep");
        let a = AccountId::from_label("a");
        let treasury = AccountId::from_label("treasury");
        fund(&h, &a, 10_000);
        h.gate.mint(&a, 1_000).unwrap();

        assert!(matches!(
            h.gate.admin_withdraw(&a, &treasury, 100, 0).unwrap_err(),
            TenureError::Unauthorized
        ));
        assert!(matches!(
            h.gate.admin_withdraw(&h.admin, &treasury, 2_000, 0).unwrap_err(),
            TenureError::InsufficientBalance { need: 2_000, have: 1_000 }
        ));

        h.gate.admin_withdraw(&h.admin, &treasury, 400, 0).unwrap();
        assert_eq!(h.token.balance_of(&treasury).unwrap(), 400);

        let swept = h.gate.admin_withdraw_all(&h.admin, &treasury, 0).unwrap();
        assert_eq!(swept.amount, 600);
        assert_eq!(h.token.balance_of(&h.vault).unwrap(), 0);
        assert!(h.gate.admin_withdraw_all(&h.admin, &treasury, 0).is_err());
    }

    #[test]
    fn participant_record_tracks_history() {
        let h = harness("record");
        let a = AccountId::from_label("a");
        fund(&h, &a, 10_000);
        h.gate.mint(&a, 1_000).unwrap();
        h.gate.mint(&a, 1_000 + DAY).unwrap();

        let record = h.gate.participant(&a).unwrap().unwrap();
        assert_eq!(record.last_purchase_day, 1);
        assert!(record.has_purchased);
        assert_eq!(record.mint_count, 2);
    }
}
