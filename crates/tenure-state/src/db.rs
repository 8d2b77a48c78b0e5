use std::path::Path;

use tenure_core::campaign::CampaignSchedule;
use tenure_core::error::TenureError;
use tenure_core::position::{ParticipantRecord, StakeAccount};
use tenure_core::types::{AccountId, Balance, DayIndex, TokenId};
use tenure_policy::PeriodTable;

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   stakes        — AccountId bytes       → bincode(StakeAccount)
///   participants  — AccountId bytes       → bincode(ParticipantRecord)
///   day_counters  — day u64 LE            → count u64 LE
///   balances      — AccountId bytes       → u128 LE
///   allowances    — owner ++ spender      → u128 LE
///   collectibles  — token id u64 LE       → AccountId bytes
///   meta          — utf8 key bytes        → raw bytes
pub struct StateDb {
    _db: sled::Db,
    stakes: sled::Tree,
    participants: sled::Tree,
    day_counters: sled::Tree,
    balances: sled::Tree,
    allowances: sled::Tree,
    collectibles: sled::Tree,
    meta: sled::Tree,
}

fn storage_err(e: impl std::fmt::Display) -> TenureError {
    TenureError::Storage(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> TenureError {
    TenureError::Serialization(e.to_string())
}

fn u128_from(bytes: &[u8]) -> Balance {
    let mut arr = [0u8; 16];
    arr.copy_from_slice(&bytes[..16]);
    u128::from_le_bytes(arr)
}

fn u64_from(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(arr)
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TenureError> {
        let db = sled::open(path).map_err(storage_err)?;
        let stakes       = db.open_tree("stakes").map_err(storage_err)?;
        let participants = db.open_tree("participants").map_err(storage_err)?;
        let day_counters = db.open_tree("day_counters").map_err(storage_err)?;
        let balances     = db.open_tree("balances").map_err(storage_err)?;
        let allowances   = db.open_tree("allowances").map_err(storage_err)?;
        let collectibles = db.open_tree("collectibles").map_err(storage_err)?;
        let meta         = db.open_tree("meta").map_err(storage_err)?;
        Ok(Self { _db: db, stakes, participants, day_counters, balances, allowances, collectibles, meta })
    }

    // ── Stake accounts ───────────────────────────────────────────────────────

    pub fn get_stake_account(&self, id: &AccountId) -> Result<Option<StakeAccount>, TenureError> {
        match self.stakes.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_stake_account(&self, book: &StakeAccount) -> Result<(), TenureError> {
        let bytes = bincode::serialize(book).map_err(ser_err)?;
        self.stakes.insert(book.account_id.as_bytes(), bytes).map_err(storage_err)?;
        Ok(())
    }

    /// Write back a prior snapshot (used when an external call fails after
    /// the internal commit). `None` means the account did not exist yet.
    pub fn restore_stake_account(
        &self,
        id: &AccountId,
        prior: Option<&StakeAccount>,
    ) -> Result<(), TenureError> {
        match prior {
            Some(book) => self.put_stake_account(book),
            None => {
                self.stakes.remove(id.as_bytes()).map_err(storage_err)?;
                Ok(())
            }
        }
    }

    // ── Threshold-gate records ───────────────────────────────────────────────

    pub fn get_participant(&self, id: &AccountId) -> Result<Option<ParticipantRecord>, TenureError> {
        match self.participants.get(id.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_participant(&self, id: &AccountId, rec: &ParticipantRecord) -> Result<(), TenureError> {
        let bytes = bincode::serialize(rec).map_err(ser_err)?;
        self.participants.insert(id.as_bytes(), bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn restore_participant(
        &self,
        id: &AccountId,
        prior: Option<&ParticipantRecord>,
    ) -> Result<(), TenureError> {
        match prior {
            Some(rec) => self.put_participant(id, rec),
            None => {
                self.participants.remove(id.as_bytes()).map_err(storage_err)?;
                Ok(())
            }
        }
    }

    pub fn day_count(&self, day: DayIndex) -> Result<u64, TenureError> {
        Ok(self
            .day_counters
            .get(day.to_le_bytes())
            .map_err(storage_err)?
            .map(|b| u64_from(&b))
            .unwrap_or(0))
    }

    pub fn put_day_count(&self, day: DayIndex, count: u64) -> Result<(), TenureError> {
        self.day_counters
            .insert(day.to_le_bytes(), &count.to_le_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Token ledger records ─────────────────────────────────────────────────

    pub fn balance(&self, id: &AccountId) -> Result<Balance, TenureError> {
        Ok(self
            .balances
            .get(id.as_bytes())
            .map_err(storage_err)?
            .map(|b| u128_from(&b))
            .unwrap_or(0))
    }

    pub fn put_balance(&self, id: &AccountId, amount: Balance) -> Result<(), TenureError> {
        self.balances
            .insert(id.as_bytes(), &amount.to_le_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    fn allowance_key(owner: &AccountId, spender: &AccountId) -> [u8; 64] {
        let mut key = [0u8; 64];
        key[..32].copy_from_slice(owner.as_bytes());
        key[32..].copy_from_slice(spender.as_bytes());
        key
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Result<Balance, TenureError> {
        Ok(self
            .allowances
            .get(Self::allowance_key(owner, spender))
            .map_err(storage_err)?
            .map(|b| u128_from(&b))
            .unwrap_or(0))
    }

    pub fn put_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Balance,
    ) -> Result<(), TenureError> {
        self.allowances
            .insert(Self::allowance_key(owner, spender), &amount.to_le_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Collectibles ─────────────────────────────────────────────────────────

    pub fn collectible_owner(&self, token_id: TokenId) -> Result<Option<AccountId>, TenureError> {
        match self.collectibles.get(token_id.to_le_bytes()).map_err(storage_err)? {
            Some(bytes) => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes[..32]);
                Ok(Some(AccountId::from_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_collectible(&self, token_id: TokenId, owner: &AccountId) -> Result<(), TenureError> {
        self.collectibles
            .insert(token_id.to_le_bytes(), owner.as_bytes().as_slice())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn collectible_exists(&self, token_id: TokenId) -> bool {
        self.collectibles.contains_key(token_id.to_le_bytes()).unwrap_or(false)
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn get_meta_u128(&self, key: &str) -> Result<Balance, TenureError> {
        Ok(self
            .meta
            .get(key.as_bytes())
            .map_err(storage_err)?
            .map(|b| u128_from(&b))
            .unwrap_or(0))
    }

    pub fn put_meta_u128(&self, key: &str, value: Balance) -> Result<(), TenureError> {
        self.meta
            .insert(key.as_bytes(), &value.to_le_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta_u64(&self, key: &str) -> Result<u64, TenureError> {
        Ok(self
            .meta
            .get(key.as_bytes())
            .map_err(storage_err)?
            .map(|b| u64_from(&b))
            .unwrap_or(0))
    }

    pub fn put_meta_u64(&self, key: &str, value: u64) -> Result<(), TenureError> {
        self.meta
            .insert(key.as_bytes(), &value.to_le_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_meta_bool(&self, key: &str) -> Result<bool, TenureError> {
        Ok(self
            .meta
            .get(key.as_bytes())
            .map_err(storage_err)?
            .map(|b| b.first() == Some(&1))
            .unwrap_or(false))
    }

    pub fn put_meta_bool(&self, key: &str, value: bool) -> Result<(), TenureError> {
        self.meta
            .insert(key.as_bytes(), &[value as u8])
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Persisted configuration ──────────────────────────────────────────────

    pub fn put_admin(&self, id: &AccountId) -> Result<(), TenureError> {
        self.meta
            .insert(b"admin_account", id.as_bytes().as_slice())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_admin(&self) -> Result<Option<AccountId>, TenureError> {
        match self.meta.get(b"admin_account").map_err(storage_err)? {
            Some(bytes) if bytes.len() >= 32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes[..32]);
                Ok(Some(AccountId::from_bytes(arr)))
            }
            Some(_) => Err(TenureError::Storage("malformed admin account record".into())),
            None => Ok(None),
        }
    }

    pub fn put_max_positions(&self, max: u32) -> Result<(), TenureError> {
        self.put_meta_u64("max_active_positions", max as u64)
    }

    pub fn get_max_positions(&self) -> Result<Option<u32>, TenureError> {
        let v = self.get_meta_u64("max_active_positions")?;
        Ok(if v == 0 { None } else { Some(v as u32) })
    }

    pub fn put_campaign(&self, schedule: &CampaignSchedule) -> Result<(), TenureError> {
        let bytes = bincode::serialize(schedule).map_err(ser_err)?;
        self.meta.insert(b"campaign_schedule", bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_campaign(&self) -> Result<Option<CampaignSchedule>, TenureError> {
        match self.meta.get(b"campaign_schedule").map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_period_table(&self, table: &PeriodTable) -> Result<(), TenureError> {
        let bytes = bincode::serialize(table).map_err(ser_err)?;
        self.meta.insert(b"period_table", bytes).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_period_table(&self) -> Result<Option<PeriodTable>, TenureError> {
        match self.meta.get(b"period_table").map_err(storage_err)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), TenureError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::position::Position;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("tenure_db_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn stake_account_round_trip() {
        let db = temp_db("stake_rt");
        let id = AccountId::from_label("alice");
        let mut book = StakeAccount::new(id.clone());
        book.positions.push(Position::new(500, 10, 100));
        book.active = 1;
        db.put_stake_account(&book).unwrap();

        let loaded = db.get_stake_account(&id).unwrap().unwrap();
        assert_eq!(loaded.positions, book.positions);
        assert_eq!(loaded.active, 1);
    }

    #[test]
    fn restore_removes_fresh_accounts() {
        let db = temp_db("restore");
        let id = AccountId::from_label("bob");
        db.put_stake_account(&StakeAccount::new(id.clone())).unwrap();
        db.restore_stake_account(&id, None).unwrap();
        assert!(db.get_stake_account(&id).unwrap().is_none());
    }

    #[test]
    fn counters_default_to_zero() {
        let db = temp_db("counters");
        assert_eq!(db.day_count(3).unwrap(), 0);
        db.put_day_count(3, 7).unwrap();
        assert_eq!(db.day_count(3).unwrap(), 7);
        assert_eq!(db.get_meta_u128("penalty_pool").unwrap(), 0);
    }

    #[test]
    fn allowance_is_keyed_by_owner_and_spender() {
        let db = temp_db("allow");
        let owner = AccountId::from_label("owner");
        let a = AccountId::from_label("spender-a");
        let b = AccountId::from_label("spender-b");
        db.put_allowance(&owner, &a, 1_000).unwrap();
        assert_eq!(db.allowance(&owner, &a).unwrap(), 1_000);
        assert_eq!(db.allowance(&owner, &b).unwrap(), 0);
    }
}
