use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenureError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("stake amount below minimum ({min} units required)")]
    StakeAmountTooSmall { min: u128 },

    #[error("invalid period index {got}: table has {len} entries")]
    InvalidPeriodIndex { got: usize, len: usize },

    #[error("period table must not be empty")]
    EmptyPeriodTable,

    #[error("period durations must be positive; entry {index} is {value}")]
    NonPositivePeriod { index: usize, value: i64 },

    #[error("campaign schedule malformed: {0}")]
    MalformedSchedule(String),

    #[error("day index {got} out of range: campaign has {num_days} days")]
    DayOutOfRange { got: u64, num_days: u64 },

    // ── State-precondition errors ────────────────────────────────────────────
    #[error("no position {id} for account {account}")]
    PositionNotFound { account: String, id: u32 },

    #[error("position not yet expired (unlocks at {unlocks_at})")]
    NotExpired { unlocks_at: i64 },

    #[error("position already expired; use ordinary withdraw")]
    AlreadyExpired,

    #[error("position already withdrawn")]
    AlreadyWithdrawn,

    #[error("previous stake expired but not withdrawn; withdraw it before staking again")]
    PreviousStakeUnresolved,

    #[error("maximum active positions reached ({max})")]
    MaxPositionsReached { max: u32 },

    #[error("urgent withdrawal already used for this position epoch")]
    UrgentAlreadyUsed,

    #[error("requested amount plus penalty exceeds position balance: need {need}, have {have}")]
    AmountPlusPenaltyExceedsBalance { need: u128, have: u128 },

    #[error("penalty pool is empty")]
    PenaltyPoolEmpty,

    #[error("daily participant capacity reached for day {day}")]
    DailyCapacityReached { day: u64 },

    #[error("account already purchased on day {day}")]
    AlreadyPurchasedToday { day: u64 },

    // ── Authorization errors ─────────────────────────────────────────────────
    #[error("caller is not the admin")]
    Unauthorized,

    // ── Availability errors ──────────────────────────────────────────────────
    #[error("campaign is not active at the current time")]
    CampaignInactive,

    #[error("operation unavailable while paused")]
    Paused,

    #[error("reentrant call rejected")]
    ReentrantCall,

    // ── Collaborator failures ────────────────────────────────────────────────
    #[error("insufficient balance: need {need} units, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("insufficient allowance: need {need} units, approved {have}")]
    InsufficientAllowance { need: u128, have: u128 },

    #[error("asset transfer failed: {0}")]
    TransferFailed(String),

    #[error("collectible {0} already minted")]
    TokenAlreadyMinted(u64),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
