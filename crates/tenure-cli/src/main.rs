//! tenure-cli
//!
//! Operator console for a local Tenure deployment. Manages the state
//! database, seeds and approves token balances, and drives both custody
//! engines (staking ledger and threshold gate) against it.
//!
//! Usage:
//!   tenure init              --admin <account> --periods <secs,...> [--max-positions <n>]
//!   tenure token seed        --to <account> --amount <tnr>
//!   tenure token approve     --owner <account> --vault <staking|campaign> --amount <tnr>
//!   tenure token balance     --account <account>
//!   tenure stake             --account <account> --amount <tnr> --period <index>
//!   tenure positions         --account <account>
//!   tenure withdraw          --account <account> --position <id>
//!   tenure extend            --account <account> --position <id> --period <index>
//!   tenure urgent            --account <account> --position <id> --amount <tnr>
//!   tenure max-urgent        --account <account> --position <id>
//!   tenure sweep-penalties   --account <admin>
//!   tenure pause | unpause   --account <admin> --target <ledger|gate>
//!   tenure campaign create   --start <ts|now> --required <tnr,...> --capacity <n,...>
//!   tenure campaign status
//!   tenure mint              --account <account>
//!   tenure required
//!   tenure info
//!
//! Accounts are given as base-58 ids; anything that does not parse as one
//! is treated as a human-readable label and hashed into a deterministic id.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use tenure_core::asset::AssetLedger;
use tenure_core::campaign::CampaignSchedule;
use tenure_core::constants::{DEFAULT_MAX_ACTIVE_POSITIONS, SECONDS_PER_DAY, UNITS_PER_TNR};
use tenure_core::types::{AccountId, Balance, PositionId};
use tenure_policy::PeriodTable;
use tenure_state::{Registry, StakingLedger, StateDb, ThresholdGate, TokenLedger};

// Vault ids are derived, not configured: both engines and every CLI
// invocation agree on them without reading state.
const STAKING_VAULT_LABEL: &str = "tenure/staking-vault";
const CAMPAIGN_VAULT_LABEL: &str = "tenure/campaign-vault";

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tenure", version, about = "Tenure — time-locked token custody")]
struct Args {
    /// Path to the state database directory.
    #[arg(long, global = true, default_value = "~/.tenure/data")]
    data_dir: PathBuf,

    /// Override the clock (unix seconds, UTC). Defaults to the current time.
    #[arg(long, global = true)]
    at: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VaultKind {
    Staking,
    Campaign,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineKind {
    Ledger,
    Gate,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the state database: admin account and period table.
    Init {
        /// Admin account (base-58 or label).
        #[arg(long)]
        admin: String,
        /// Comma-separated lock durations in seconds, e.g. 604800,2592000.
        #[arg(long)]
        periods: String,
        /// Maximum simultaneously active positions per account.
        #[arg(long, default_value_t = DEFAULT_MAX_ACTIVE_POSITIONS)]
        max_positions: u32,
    },

    /// Token ledger operations.
    #[command(subcommand)]
    Token(TokenCommand),

    /// Lock tokens into a new staking position.
    Stake {
        #[arg(long)]
        account: String,
        /// Amount in TNR.
        #[arg(long)]
        amount: f64,
        /// Index into the period table.
        #[arg(long)]
        period: usize,
    },

    /// Print an account's position book as JSON.
    Positions {
        #[arg(long)]
        account: String,
    },

    /// Withdraw a matured position.
    Withdraw {
        #[arg(long)]
        account: String,
        #[arg(long)]
        position: u32,
    },

    /// Roll an expired position into a fresh lock.
    Extend {
        #[arg(long)]
        account: String,
        #[arg(long)]
        position: u32,
        /// Index into the period table.
        #[arg(long)]
        period: usize,
    },

    /// Withdraw early, paying the tiered penalty.
    Urgent {
        #[arg(long)]
        account: String,
        #[arg(long)]
        position: u32,
        /// Amount to receive, in TNR.
        #[arg(long)]
        amount: f64,
    },

    /// Print the largest amount an urgent withdrawal could receive right now.
    MaxUrgent {
        #[arg(long)]
        account: String,
        #[arg(long)]
        position: u32,
    },

    /// Transfer the accumulated penalty pool to the admin.
    SweepPenalties {
        /// Calling account; must be the admin.
        #[arg(long)]
        account: String,
    },

    /// Pause an engine's entry points (withdrawals stay open).
    Pause {
        #[arg(long)]
        account: String,
        #[arg(long)]
        target: EngineKind,
    },

    /// Resume a paused engine.
    Unpause {
        #[arg(long)]
        account: String,
        #[arg(long)]
        target: EngineKind,
    },

    /// Mint-campaign operations.
    #[command(subcommand)]
    Campaign(CampaignCommand),

    /// Mint today's collectible, paying the day's required deposit.
    Mint {
        #[arg(long)]
        account: String,
    },

    /// Print today's required deposit and remaining capacity.
    Required,

    /// Print overall ledger state: supply, locked total, penalty pool.
    Info,
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Credit freshly issued supply to an account (admin-only).
    Seed {
        #[arg(long)]
        to: String,
        /// Amount in TNR.
        #[arg(long)]
        amount: f64,
    },

    /// Approve one of the vaults to pull from an account.
    Approve {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        vault: VaultKind,
        /// Allowance in TNR (overwrites the previous allowance).
        #[arg(long)]
        amount: f64,
    },

    /// Print an account's balance.
    Balance {
        #[arg(long)]
        account: String,
    },
}

#[derive(Subcommand, Debug)]
enum CampaignCommand {
    /// Create the mint-campaign schedule. One-shot: rerunning replaces it
    /// only while no deposits have been taken.
    Create {
        /// Campaign start (unix seconds, or the word "now").
        #[arg(long)]
        start: String,
        /// Comma-separated required deposit per day, in TNR.
        #[arg(long)]
        required: String,
        /// Comma-separated participant capacity per day.
        #[arg(long)]
        capacity: String,
    },

    /// Print the campaign window and today's standing.
    Status,
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,tenure_state=info,tenure_cli=info".into()),
        )
        .init();

    let args = Args::parse();
    let data_dir = expand_tilde(&args.data_dir);
    let now = args.at.unwrap_or_else(|| chrono::Utc::now().timestamp());

    let db = Arc::new(
        StateDb::open(&data_dir)
            .with_context(|| format!("opening state db at {}", data_dir.display()))?,
    );

    let result = run(&args.command, Arc::clone(&db), now);
    db.flush().context("flushing state db")?;
    result
}

fn run(command: &Command, db: Arc<StateDb>, now: i64) -> anyhow::Result<()> {
    match command {
        Command::Init { admin, periods, max_positions } => {
            if db.get_admin()?.is_some() {
                bail!("state db already initialized");
            }
            if *max_positions == 0 {
                bail!("--max-positions must be at least 1");
            }
            let admin = parse_account(admin);
            let table = PeriodTable::new(parse_i64_list(periods)?)?;
            db.put_admin(&admin)?;
            db.put_period_table(&table)?;
            db.put_max_positions(*max_positions)?;
            println!("Initialized.");
            println!("Admin:          {}", admin);
            println!("Periods (days): {:?}",
                table.iter().map(|p| p / SECONDS_PER_DAY).collect::<Vec<_>>());
            println!("Staking vault:  {}", AccountId::from_label(STAKING_VAULT_LABEL));
            println!("Campaign vault: {}", AccountId::from_label(CAMPAIGN_VAULT_LABEL));
            Ok(())
        }

        Command::Token(cmd) => run_token(cmd, db),

        Command::Stake { account, amount, period } => {
            let ledger = open_ledger(db)?;
            let event =
                ledger.stake(&parse_account(account), tnr_to_units(*amount)?, *period, now)?;
            println!("Staked {} TNR into position {}", amount, event.position_id);
            println!("Unlocks at: {}", format_ts(event.unlocks_at));
            Ok(())
        }

        Command::Positions { account } => {
            let ledger = open_ledger(db)?;
            let positions = ledger.positions(&parse_account(account))?;
            println!("{}", serde_json::to_string_pretty(&positions)?);
            Ok(())
        }

        Command::Withdraw { account, position } => {
            let ledger = open_ledger(db)?;
            let event = ledger.withdraw(&parse_account(account), PositionId(*position), now)?;
            println!("Withdrew {} TNR from position {}", units_to_tnr(event.amount), event.position_id);
            Ok(())
        }

        Command::Extend { account, position, period } => {
            let ledger = open_ledger(db)?;
            let event =
                ledger.extend(&parse_account(account), PositionId(*position), *period, now)?;
            println!("Extended position {}; unlocks at {}", event.position_id, format_ts(event.unlocks_at));
            Ok(())
        }

        Command::Urgent { account, position, amount } => {
            let ledger = open_ledger(db)?;
            let event = ledger.urgent_withdraw(
                &parse_account(account),
                PositionId(*position),
                tnr_to_units(*amount)?,
                now,
            )?;
            println!(
                "Urgent withdrawal: received {} TNR, penalty {} TNR",
                units_to_tnr(event.amount),
                units_to_tnr(event.penalty)
            );
            Ok(())
        }

        Command::MaxUrgent { account, position } => {
            let ledger = open_ledger(db)?;
            let max =
                ledger.max_urgent_withdraw(&parse_account(account), PositionId(*position), now)?;
            println!("Max urgent withdrawal: {} TNR ({} units)", units_to_tnr(max), max);
            Ok(())
        }

        Command::SweepPenalties { account } => {
            let ledger = open_ledger(db)?;
            let event = ledger.sweep_penalties(&parse_account(account), now)?;
            println!("Swept {} TNR of penalties to the admin", units_to_tnr(event.amount));
            Ok(())
        }

        Command::Pause { account, target } => set_paused(db, account, *target, true),
        Command::Unpause { account, target } => set_paused(db, account, *target, false),

        Command::Campaign(cmd) => run_campaign(cmd, db, now),

        Command::Mint { account } => {
            let gate = open_gate(db)?;
            let event = gate.mint(&parse_account(account), now)?;
            println!(
                "Minted collectible #{} on day {} for {} TNR",
                event.token_id,
                event.day,
                units_to_tnr(event.amount)
            );
            Ok(())
        }

        Command::Required => {
            let gate = open_gate(db)?;
            match gate.current_day(now) {
                Some(day) => {
                    println!("Day:       {}", day);
                    println!("Required:  {} TNR", units_to_tnr(gate.required_deposit(day)?));
                    println!("Remaining: {} slots", gate.remaining_today(now)?);
                }
                None => println!("Campaign is not active right now."),
            }
            Ok(())
        }

        Command::Info => {
            let admin = db.get_admin()?.context("state db not initialized; run `tenure init`")?;
            let token = TokenLedger::new(Arc::clone(&db), admin.clone());
            let ledger = open_ledger(Arc::clone(&db))?;
            println!("Admin:         {}", admin);
            println!("Total supply:  {} TNR", units_to_tnr(token.total_supply()?));
            println!("Total staked:  {} TNR", units_to_tnr(ledger.total_staked()?));
            println!("Penalty pool:  {} TNR", units_to_tnr(ledger.penalty_pool()?));
            println!("Ledger paused: {}", ledger.is_paused()?);
            Ok(())
        }
    }
}

// ── Token subcommands ─────────────────────────────────────────────────────────

fn run_token(cmd: &TokenCommand, db: Arc<StateDb>) -> anyhow::Result<()> {
    let admin = db.get_admin()?.context("state db not initialized; run `tenure init`")?;
    let token = TokenLedger::new(db, admin.clone());

    match cmd {
        TokenCommand::Seed { to, amount } => {
            let to = parse_account(to);
            token.mint_supply(&admin, &to, tnr_to_units(*amount)?)?;
            println!("Seeded {} TNR to {}", amount, to);
            Ok(())
        }

        TokenCommand::Approve { owner, vault, amount } => {
            let owner = parse_account(owner);
            let spender = vault_account(*vault);
            token.approve(&owner, &spender, tnr_to_units(*amount)?)?;
            println!("Approved {} TNR: {} -> {}", amount, owner, spender);
            Ok(())
        }

        TokenCommand::Balance { account } => {
            let account = parse_account(account);
            let units = token.balance_of(&account)?;
            println!("Account: {}", account);
            println!("Balance: {} TNR  ({} units)", units_to_tnr(units), units);
            Ok(())
        }
    }
}

// ── Campaign subcommands ──────────────────────────────────────────────────────

fn run_campaign(cmd: &CampaignCommand, db: Arc<StateDb>, now: i64) -> anyhow::Result<()> {
    match cmd {
        CampaignCommand::Create { start, required, capacity } => {
            if db.get_campaign()?.is_some() && Registry::new(Arc::clone(&db)).total_minted()? > 0 {
                bail!("campaign already has minted collectibles; refusing to replace its schedule");
            }
            let start_ts = if start == "now" { now } else { start.parse()? };
            let required: Vec<Balance> = parse_f64_list(required)?
                .into_iter()
                .map(tnr_to_units)
                .collect::<anyhow::Result<_>>()?;
            let capacity: Vec<u64> = capacity
                .split(',')
                .map(|s| s.trim().parse().context("parsing capacity entry"))
                .collect::<anyhow::Result<_>>()?;
            let duration = (required.len() as i64) * SECONDS_PER_DAY;

            let schedule = CampaignSchedule::new(start_ts, duration, required, capacity)?;
            db.put_campaign(&schedule)?;
            println!("Campaign created: {} days starting {}",
                schedule.num_days(), format_ts(schedule.starting_timestamp()));
            Ok(())
        }

        CampaignCommand::Status => {
            let gate = open_gate(db)?;
            let schedule = gate.schedule();
            println!("Window: {} .. {}",
                format_ts(schedule.starting_timestamp()), format_ts(schedule.ends_at()));
            match gate.current_day(now) {
                Some(day) => {
                    println!("Today:  day {} of {}", day, schedule.num_days());
                    println!("  required:  {} TNR", units_to_tnr(gate.required_deposit(day)?));
                    println!("  minted:    {}", gate.minted_on(day)?);
                    println!("  remaining: {} slots", gate.remaining_today(now)?);
                }
                None => println!("Today:  outside the campaign window"),
            }
            println!("Paused: {}", gate.is_paused()?);
            Ok(())
        }
    }
}

// ── Engine construction ───────────────────────────────────────────────────────

fn open_ledger(db: Arc<StateDb>) -> anyhow::Result<StakingLedger<TokenLedger>> {
    let admin = db.get_admin()?.context("state db not initialized; run `tenure init`")?;
    let periods = db
        .get_period_table()?
        .context("no period table found; run `tenure init`")?;
    let max_positions = db.get_max_positions()?.unwrap_or(DEFAULT_MAX_ACTIVE_POSITIONS);
    let token = TokenLedger::new(Arc::clone(&db), admin.clone());
    Ok(StakingLedger::new(
        db,
        token,
        periods,
        admin,
        AccountId::from_label(STAKING_VAULT_LABEL),
        max_positions,
    ))
}

fn open_gate(db: Arc<StateDb>) -> anyhow::Result<ThresholdGate<TokenLedger, Registry>> {
    let admin = db.get_admin()?.context("state db not initialized; run `tenure init`")?;
    let schedule = db
        .get_campaign()?
        .context("no campaign schedule found; run `tenure campaign create`")?;
    let token = TokenLedger::new(Arc::clone(&db), admin.clone());
    let registry = Registry::new(Arc::clone(&db));
    Ok(ThresholdGate::new(
        db,
        token,
        registry,
        schedule,
        admin,
        AccountId::from_label(CAMPAIGN_VAULT_LABEL),
    ))
}

fn set_paused(
    db: Arc<StateDb>,
    account: &str,
    target: EngineKind,
    paused: bool,
) -> anyhow::Result<()> {
    let caller = parse_account(account);
    match target {
        EngineKind::Ledger => open_ledger(db)?.set_paused(&caller, paused)?,
        EngineKind::Gate => open_gate(db)?.set_paused(&caller, paused)?,
    }
    println!("{:?} {}", target, if paused { "paused" } else { "unpaused" });
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn vault_account(kind: VaultKind) -> AccountId {
    match kind {
        VaultKind::Staking => AccountId::from_label(STAKING_VAULT_LABEL),
        VaultKind::Campaign => AccountId::from_label(CAMPAIGN_VAULT_LABEL),
    }
}

/// Base-58 id, or a label hashed into one.
fn parse_account(s: &str) -> AccountId {
    AccountId::from_b58(s).unwrap_or_else(|_| AccountId::from_label(s))
}

fn tnr_to_units(tnr: f64) -> anyhow::Result<Balance> {
    if !tnr.is_finite() || tnr < 0.0 {
        bail!("invalid amount: {tnr}");
    }
    Ok((tnr * UNITS_PER_TNR as f64).round() as Balance)
}

fn units_to_tnr(units: Balance) -> f64 {
    units as f64 / UNITS_PER_TNR as f64
}

fn parse_i64_list(s: &str) -> anyhow::Result<Vec<i64>> {
    s.split(',')
        .map(|p| p.trim().parse::<i64>().with_context(|| format!("parsing list entry {p:?}")))
        .collect()
}

fn parse_f64_list(s: &str) -> anyhow::Result<Vec<f64>> {
    s.split(',')
        .map(|p| p.trim().parse::<f64>().with_context(|| format!("parsing list entry {p:?}")))
        .collect()
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.clone()
}

fn format_ts(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => format!("{} ({})", ts, dt.format("%Y-%m-%d %H:%M:%S UTC")),
        None => ts.to_string(),
    }
}
