use std::sync::Arc;

use tenure_core::asset::AssetLedger;
use tenure_core::error::TenureError;
use tenure_core::types::{AccountId, Balance};
use tracing::info;

use crate::db::StateDb;

/// Sled-backed fungible-asset ledger with ERC-20-shaped semantics.
///
/// Every transfer is all-or-nothing: balances and allowances are checked
/// up front and either both sides move or nothing does. Authentication of
/// `owner`/`from` is the host's job; this ledger trusts the ids it is
/// handed the way an on-chain token trusts `msg.sender`.
pub struct TokenLedger {
    db: Arc<StateDb>,
    admin: AccountId,
}

impl TokenLedger {
    pub fn new(db: Arc<StateDb>, admin: AccountId) -> Self {
        Self { db, admin }
    }

    /// Credit freshly issued supply to `to`. Admin-only.
    pub fn mint_supply(
        &self,
        caller: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), TenureError> {
        if caller != &self.admin {
            return Err(TenureError::Unauthorized);
        }
        if amount == 0 {
            return Err(TenureError::ZeroAmount);
        }
        let balance = self.db.balance(to)?;
        self.db.put_balance(to, balance + amount)?;
        let supply = self.db.get_meta_u128("token_total_supply")?;
        self.db.put_meta_u128("token_total_supply", supply + amount)?;
        info!(to = %to, amount, "supply minted");
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s balance (overwrite, not add).
    pub fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Balance,
    ) -> Result<(), TenureError> {
        self.db.put_allowance(owner, spender, amount)
    }

    pub fn total_supply(&self) -> Result<Balance, TenureError> {
        self.db.get_meta_u128("token_total_supply")
    }

    fn move_balance(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), TenureError> {
        let from_balance = self.db.balance(from)?;
        if from_balance < amount {
            return Err(TenureError::InsufficientBalance { need: amount, have: from_balance });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self.db.balance(to)?;
        self.db.put_balance(from, from_balance - amount)?;
        self.db.put_balance(to, to_balance + amount)?;
        Ok(())
    }
}

impl AssetLedger for TokenLedger {
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Balance)
        -> Result<(), TenureError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), TenureError> {
        let approved = self.db.allowance(owner, spender)?;
        if approved < amount {
            return Err(TenureError::InsufficientAllowance { need: amount, have: approved });
        }
        self.move_balance(owner, to, amount)?;
        self.db.put_allowance(owner, spender, approved - amount)?;
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> Result<Balance, TenureError> {
        self.db.balance(account)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Result<Balance, TenureError> {
        self.db.allowance(owner, spender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token(name: &str) -> (TokenLedger, AccountId) {
        let dir = std::env::temp_dir().join(format!("tenure_token_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = Arc::new(StateDb::open(&dir).expect("open temp db"));
        let admin = AccountId::from_label("token-admin");
        (TokenLedger::new(db, admin.clone()), admin)
    }

    #[test]
    fn mint_requires_admin() {
        let (token, admin) = temp_token("mint_admin");
        let outsider = AccountId::from_label("outsider");
        assert!(matches!(
            token.mint_supply(&outsider, &outsider, 100).unwrap_err(),
            TenureError::Unauthorized
        ));
        token.mint_supply(&admin, &outsider, 100).unwrap();
        assert_eq!(token.balance_of(&outsider).unwrap(), 100);
        assert_eq!(token.total_supply().unwrap(), 100);
    }

    #[test]
    fn transfer_is_all_or_nothing() {
        let (token, admin) = temp_token("transfer");
        let a = AccountId::from_label("a");
        let b = AccountId::from_label("b");
        token.mint_supply(&admin, &a, 50).unwrap();

        assert!(matches!(
            token.transfer(&a, &b, 51).unwrap_err(),
            TenureError::InsufficientBalance { need: 51, have: 50 }
        ));
        assert_eq!(token.balance_of(&a).unwrap(), 50);
        assert_eq!(token.balance_of(&b).unwrap(), 0);

        token.transfer(&a, &b, 20).unwrap();
        assert_eq!(token.balance_of(&a).unwrap(), 30);
        assert_eq!(token.balance_of(&b).unwrap(), 20);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let (token, admin) = temp_token("allowance");
        let owner = AccountId::from_label("owner");
        let vault = AccountId::from_label("vault");
        token.mint_supply(&admin, &owner, 1_000).unwrap();
        token.approve(&owner, &vault, 300).unwrap();

        token.transfer_from(&vault, &owner, &vault, 200).unwrap();
        assert_eq!(token.balance_of(&vault).unwrap(), 200);
        assert_eq!(token.allowance(&owner, &vault).unwrap(), 100);

        assert!(matches!(
            token.transfer_from(&vault, &owner, &vault, 101).unwrap_err(),
            TenureError::InsufficientAllowance { need: 101, have: 100 }
        ));
    }
}
