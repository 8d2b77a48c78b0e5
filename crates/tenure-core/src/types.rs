use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance in base units (1 TNR = 1_000_000 units). u128 leaves ample
/// headroom for any realistic supply times the bps arithmetic.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Zero-based campaign day index.
pub type DayIndex = u64;

/// Sequential collectible identifier, allocated by the registry.
pub type TokenId = u64;

/// Penalty / fee rate in basis points (10_000 = 100%).
pub type RateBps = u32;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier. Authentication of callers is outside the
/// ledger's scope; the id is an opaque handle supplied by the host.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a deterministic id from a human-readable label.
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        if bytes.len() != 32 {
            return Err(bs58::decode::Error::BufferTooSmall);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_b58()[..8])
    }
}

// ── PositionId ───────────────────────────────────────────────────────────────

/// Index of a position within an account's book. Slot indices are stable:
/// a tombstoned slot keeps its index and may be reused by a later stake.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u32);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_b58_round_trip() {
        let id = AccountId::from_label("alice");
        let s = id.to_b58();
        assert_eq!(AccountId::from_b58(&s).unwrap(), id);
    }

    #[test]
    fn account_id_b58_rejects_wrong_length() {
        assert!(AccountId::from_b58("abc").is_err());
    }

    #[test]
    fn label_derivation_is_deterministic() {
        assert_eq!(AccountId::from_label("vault"), AccountId::from_label("vault"));
        assert_ne!(AccountId::from_label("vault"), AccountId::from_label("admin"));
    }
}
