use serde::{Deserialize, Serialize};

use tenure_core::error::TenureError;

/// Ordered list of allowed lock durations in seconds.
///
/// Immutable after construction: `new` rejects empty tables and
/// non-positive entries, so a held `PeriodTable` is always valid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodTable {
    periods: Vec<i64>,
}

impl PeriodTable {
    pub fn new(periods: Vec<i64>) -> Result<Self, TenureError> {
        if periods.is_empty() {
            return Err(TenureError::EmptyPeriodTable);
        }
        for (index, &value) in periods.iter().enumerate() {
            if value <= 0 {
                return Err(TenureError::NonPositivePeriod { index, value });
            }
        }
        Ok(Self { periods })
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        false // construction guarantees at least one entry
    }

    /// Duration at `index`, or `InvalidPeriodIndex`.
    pub fn duration(&self, index: usize) -> Result<i64, TenureError> {
        self.periods
            .get(index)
            .copied()
            .ok_or(TenureError::InvalidPeriodIndex { got: index, len: self.periods.len() })
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.periods.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenure_core::constants::SECONDS_PER_DAY;

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(PeriodTable::new(vec![]).unwrap_err(), TenureError::EmptyPeriodTable));
    }

    #[test]
    fn rejects_non_positive_entries() {
        let err = PeriodTable::new(vec![SECONDS_PER_DAY, 0]).unwrap_err();
        assert!(matches!(err, TenureError::NonPositivePeriod { index: 1, value: 0 }));
        assert!(PeriodTable::new(vec![-5]).is_err());
    }

    #[test]
    fn lookup_is_bounds_checked() {
        let table = PeriodTable::new(vec![7 * SECONDS_PER_DAY, 30 * SECONDS_PER_DAY]).unwrap();
        assert_eq!(table.duration(0).unwrap(), 7 * SECONDS_PER_DAY);
        assert_eq!(table.duration(1).unwrap(), 30 * SECONDS_PER_DAY);
        assert!(matches!(
            table.duration(2).unwrap_err(),
            TenureError::InvalidPeriodIndex { got: 2, len: 2 }
        ));
    }
}
