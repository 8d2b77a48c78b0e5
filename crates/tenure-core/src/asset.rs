use crate::error::TenureError;
use crate::types::{AccountId, Balance, TokenId};

/// The external fungible-asset ledger the custody engines debit and credit.
///
/// Contract: every call is all-or-nothing. A non-success return is a hard
/// abort of the calling transition; the engines never assume a partial
/// transfer happened. Serialization of concurrent mutations per account is
/// the host's responsibility.
pub trait AssetLedger {
    /// Move `amount` from `from` to `to`. `from` is an account the caller
    /// is entitled to spend from directly (for the engines: their vault).
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Balance)
        -> Result<(), TenureError>;

    /// Move `amount` from `owner` to `to` on the strength of an allowance
    /// previously granted to `spender`.
    fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), TenureError>;

    fn balance_of(&self, account: &AccountId) -> Result<Balance, TenureError>;

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Result<Balance, TenureError>;
}

/// Identity registry for the non-transferable collectible.
///
/// Non-transferability, metadata and URI serving live entirely behind this
/// trait; the threshold gate only allocates ids and mints.
pub trait CollectibleRegistry {
    /// The id the next successful `mint` will receive.
    fn next_token_id(&self) -> Result<TokenId, TenureError>;

    /// Record `token_id` as owned by `to`. Must reject a reused id.
    fn mint(&self, to: &AccountId, token_id: TokenId) -> Result<(), TenureError>;
}
