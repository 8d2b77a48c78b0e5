use std::sync::Arc;

use tenure_core::asset::CollectibleRegistry;
use tenure_core::error::TenureError;
use tenure_core::types::{AccountId, TokenId};
use tracing::info;

use crate::db::StateDb;

/// Sled-backed identity registry for the non-transferable collectible.
///
/// Ids are sequential starting at 1. The registry exposes no transfer
/// surface at all; ownership is fixed at mint time.
pub struct Registry {
    db: Arc<StateDb>,
}

impl Registry {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Option<AccountId>, TenureError> {
        self.db.collectible_owner(token_id)
    }

    pub fn total_minted(&self) -> Result<u64, TenureError> {
        self.db.get_meta_u64("collectibles_minted")
    }
}

impl CollectibleRegistry for Registry {
    fn next_token_id(&self) -> Result<TokenId, TenureError> {
        Ok(self.db.get_meta_u64("collectibles_minted")? + 1)
    }

    fn mint(&self, to: &AccountId, token_id: TokenId) -> Result<(), TenureError> {
        if self.db.collectible_exists(token_id) {
            return Err(TenureError::TokenAlreadyMinted(token_id));
        }
        self.db.put_collectible(token_id, to)?;
        self.db.put_meta_u64("collectibles_minted", token_id.max(self.total_minted()? + 1))?;
        info!(token_id, owner = %to, "collectible minted");
        Ok(())
    }
}
