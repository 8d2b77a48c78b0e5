//! End-to-end flow over a single state database: token issuance, staking
//! lifecycle, and a mint campaign running side by side.
//!
//! Run with:
//!   cargo test -p tenure-state --test full_flow

use std::sync::Arc;

use tenure_core::asset::AssetLedger;
use tenure_core::campaign::CampaignSchedule;
use tenure_core::constants::{SECONDS_PER_DAY, UNITS_PER_TNR};
use tenure_core::types::AccountId;
use tenure_policy::PeriodTable;
use tenure_state::{Registry, StakingLedger, StateDb, ThresholdGate, TokenLedger};

const DAY: i64 = SECONDS_PER_DAY;
const TNR: u128 = UNITS_PER_TNR;

struct World {
    token: TokenLedger,
    ledger: StakingLedger<TokenLedger>,
    gate: ThresholdGate<TokenLedger, Registry>,
    admin: AccountId,
    staking_vault: AccountId,
    campaign_vault: AccountId,
}

fn world(name: &str, campaign_start: i64) -> World {
    let dir = std::env::temp_dir().join(format!("tenure_full_flow_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    let db = Arc::new(StateDb::open(&dir).expect("open temp db"));

    let admin = AccountId::from_label("admin");
    let staking_vault = AccountId::from_label("staking-vault");
    let campaign_vault = AccountId::from_label("campaign-vault");

    let token = TokenLedger::new(Arc::clone(&db), admin.clone());
    let periods = PeriodTable::new(vec![7 * DAY, 30 * DAY, 90 * DAY]).unwrap();
    let ledger = StakingLedger::new(
        Arc::clone(&db),
        TokenLedger::new(Arc::clone(&db), admin.clone()),
        periods,
        admin.clone(),
        staking_vault.clone(),
        10,
    );
    let schedule = CampaignSchedule::new(
        campaign_start,
        3 * DAY,
        vec![10 * TNR, 12 * TNR, 15 * TNR],
        vec![2, 2, 2],
    )
    .unwrap();
    let gate = ThresholdGate::new(
        Arc::clone(&db),
        TokenLedger::new(Arc::clone(&db), admin.clone()),
        Registry::new(Arc::clone(&db)),
        schedule,
        admin.clone(),
        campaign_vault.clone(),
    );

    World { token, ledger, gate, admin, staking_vault, campaign_vault }
}

fn onboard(w: &World, who: &AccountId, amount: u128) {
    w.token.mint_supply(&w.admin, who, amount).unwrap();
    w.token.approve(who, &w.staking_vault, amount).unwrap();
    w.token.approve(who, &w.campaign_vault, amount).unwrap();
}

#[test]
fn staking_and_campaign_share_one_database() {
    let w = world("shared", 0);
    let alice = AccountId::from_label("alice");
    let bob = AccountId::from_label("bob");
    onboard(&w, &alice, 1_000 * TNR);
    onboard(&w, &bob, 1_000 * TNR);

    // Day 0: alice stakes and mints; bob only mints.
    let staked = w.ledger.stake(&alice, 500 * TNR, 1, 0).unwrap();
    w.gate.mint(&alice, 100).unwrap();
    w.gate.mint(&bob, 200).unwrap();

    assert_eq!(w.token.balance_of(&alice).unwrap(), 490 * TNR);
    assert_eq!(w.token.balance_of(&w.staking_vault).unwrap(), 500 * TNR);
    assert_eq!(w.token.balance_of(&w.campaign_vault).unwrap(), 20 * TNR);

    // Day 2: alice exits early; the penalty lands in the staking vault's pool
    // and never touches the campaign vault.
    w.ledger.urgent_withdraw(&alice, staked.position_id, 100 * TNR, 2 * DAY).unwrap();
    let pool = w.ledger.penalty_pool().unwrap();
    assert_eq!(pool, 5 * TNR); // 28 days remaining, 5% tier
    w.gate.mint(&alice, 2 * DAY + 50).unwrap();

    // Vault conservation holds engine by engine.
    assert_eq!(
        w.token.balance_of(&w.staking_vault).unwrap(),
        w.ledger.total_staked().unwrap() + pool
    );
    assert_eq!(w.token.balance_of(&w.campaign_vault).unwrap(), (10 + 10 + 15) * TNR);

    // Admin drains both revenue streams.
    w.ledger.sweep_penalties(&w.admin, 3 * DAY).unwrap();
    let treasury = AccountId::from_label("treasury");
    w.gate.admin_withdraw_all(&w.admin, &treasury, 3 * DAY).unwrap();
    assert_eq!(w.token.balance_of(&w.admin).unwrap(), 5 * TNR);
    assert_eq!(w.token.balance_of(&treasury).unwrap(), 35 * TNR);

    // Everyone's tokens are accounted for: supply equals the sum of all
    // holdings.
    let held = w.token.balance_of(&alice).unwrap()
        + w.token.balance_of(&bob).unwrap()
        + w.token.balance_of(&w.admin).unwrap()
        + w.token.balance_of(&treasury).unwrap()
        + w.token.balance_of(&w.staking_vault).unwrap()
        + w.token.balance_of(&w.campaign_vault).unwrap();
    assert_eq!(held, w.token.total_supply().unwrap());
}

#[test]
fn state_survives_reopen() {
    let dir = std::env::temp_dir().join("tenure_full_flow_reopen");
    let _ = std::fs::remove_dir_all(&dir);
    let admin = AccountId::from_label("admin");
    let vault = AccountId::from_label("staking-vault");
    let alice = AccountId::from_label("alice");
    let periods = PeriodTable::new(vec![7 * DAY]).unwrap();

    let position_id = {
        let db = Arc::new(StateDb::open(&dir).expect("open"));
        let token = TokenLedger::new(Arc::clone(&db), admin.clone());
        let ledger = StakingLedger::new(
            Arc::clone(&db),
            TokenLedger::new(Arc::clone(&db), admin.clone()),
            periods.clone(),
            admin.clone(),
            vault.clone(),
            10,
        );
        token.mint_supply(&admin, &alice, 100 * TNR).unwrap();
        token.approve(&alice, &vault, 100 * TNR).unwrap();
        let staked = ledger.stake(&alice, 100 * TNR, 0, 0).unwrap();
        db.flush().unwrap();
        staked.position_id
    };

    let db = Arc::new(StateDb::open(&dir).expect("reopen"));
    let token = TokenLedger::new(Arc::clone(&db), admin.clone());
    let ledger = StakingLedger::new(
        Arc::clone(&db),
        TokenLedger::new(Arc::clone(&db), admin.clone()),
        periods,
        admin.clone(),
        vault,
        10,
    );
    assert_eq!(ledger.total_staked().unwrap(), 100 * TNR);
    ledger.withdraw(&alice, position_id, 7 * DAY).unwrap();
    assert_eq!(token.balance_of(&alice).unwrap(), 100 * TNR);
}
