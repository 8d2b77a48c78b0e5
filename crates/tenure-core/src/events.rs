use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, DayIndex, PositionId, Timestamp, TokenId};

// Structured facts emitted by committed transitions. Hosts may forward
// these to whatever sink they like; the engines also log them via tracing.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Staked {
    pub account: AccountId,
    pub position_id: PositionId,
    /// False when a tombstoned slot was reused rather than freshly allocated.
    pub new_slot: bool,
    pub amount: Balance,
    pub period: i64,
    pub start: Timestamp,
    pub unlocks_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Withdrawn {
    pub account: AccountId,
    pub position_id: PositionId,
    pub amount: Balance,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Extended {
    pub account: AccountId,
    pub position_id: PositionId,
    pub amount: Balance,
    pub period: i64,
    pub start: Timestamp,
    pub unlocks_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UrgentWithdrawn {
    pub account: AccountId,
    pub position_id: PositionId,
    pub amount: Balance,
    pub penalty: Balance,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PenaltiesSwept {
    pub admin: AccountId,
    pub amount: Balance,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectibleMinted {
    pub account: AccountId,
    pub token_id: TokenId,
    pub amount: Balance,
    pub day: DayIndex,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignSwept {
    pub admin: AccountId,
    pub to: AccountId,
    pub amount: Balance,
    pub timestamp: Timestamp,
}
