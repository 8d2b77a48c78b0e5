use serde::{Deserialize, Serialize};

use crate::constants::SECONDS_PER_DAY;
use crate::error::TenureError;
use crate::types::{Balance, DayIndex, Timestamp};

/// Immutable mint-campaign schedule: one required deposit amount and one
/// participant capacity per calendar day of the campaign window.
///
/// Day indexing is zero-based over `[0, num_days)`. "No current day" is
/// expressed as `None`, never as an in-range sentinel index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignSchedule {
    starting_timestamp: Timestamp,
    duration_secs: i64,
    daily_required: Vec<Balance>,
    daily_capacity: Vec<u64>,
}

impl CampaignSchedule {
    /// Validates and constructs a schedule. Rules:
    /// - duration positive and an exact multiple of one day,
    /// - both tables exactly `duration / 86_400` entries long,
    /// - every required amount and every capacity strictly positive.
    pub fn new(
        starting_timestamp: Timestamp,
        duration_secs: i64,
        daily_required: Vec<Balance>,
        daily_capacity: Vec<u64>,
    ) -> Result<Self, TenureError> {
        if duration_secs <= 0 || duration_secs % SECONDS_PER_DAY != 0 {
            return Err(TenureError::MalformedSchedule(format!(
                "duration {duration_secs}s is not a positive multiple of one day"
            )));
        }
        let num_days = (duration_secs / SECONDS_PER_DAY) as usize;
        if daily_required.len() != num_days {
            return Err(TenureError::MalformedSchedule(format!(
                "required-amount table has {} entries, campaign has {num_days} days",
                daily_required.len()
            )));
        }
        if daily_capacity.len() != num_days {
            return Err(TenureError::MalformedSchedule(format!(
                "capacity table has {} entries, campaign has {num_days} days",
                daily_capacity.len()
            )));
        }
        if let Some(i) = daily_required.iter().position(|&a| a == 0) {
            return Err(TenureError::MalformedSchedule(format!(
                "required amount for day {i} must be strictly positive"
            )));
        }
        if let Some(i) = daily_capacity.iter().position(|&c| c == 0) {
            return Err(TenureError::MalformedSchedule(format!(
                "capacity for day {i} must be strictly positive"
            )));
        }
        Ok(Self { starting_timestamp, duration_secs, daily_required, daily_capacity })
    }

    pub fn starting_timestamp(&self) -> Timestamp {
        self.starting_timestamp
    }

    pub fn ends_at(&self) -> Timestamp {
        self.starting_timestamp + self.duration_secs
    }

    pub fn num_days(&self) -> u64 {
        (self.duration_secs / SECONDS_PER_DAY) as u64
    }

    /// Zero-based day index for `now`, or `None` outside the window.
    /// The end instant is exclusive: `now == ends_at()` is already outside.
    pub fn current_day(&self, now: Timestamp) -> Option<DayIndex> {
        if now < self.starting_timestamp || now >= self.ends_at() {
            return None;
        }
        Some(((now - self.starting_timestamp) / SECONDS_PER_DAY) as DayIndex)
    }

    pub fn required_deposit(&self, day: DayIndex) -> Result<Balance, TenureError> {
        self.daily_required
            .get(day as usize)
            .copied()
            .ok_or(TenureError::DayOutOfRange { got: day, num_days: self.num_days() })
    }

    pub fn capacity(&self, day: DayIndex) -> Result<u64, TenureError> {
        self.daily_capacity
            .get(day as usize)
            .copied()
            .ok_or(TenureError::DayOutOfRange { got: day, num_days: self.num_days() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = 1_700_000_000;

    fn two_day_schedule() -> CampaignSchedule {
        CampaignSchedule::new(T0, 2 * SECONDS_PER_DAY, vec![1_000, 1_100], vec![2, 2]).unwrap()
    }

    #[test]
    fn rejects_ragged_duration() {
        let err = CampaignSchedule::new(T0, SECONDS_PER_DAY + 1, vec![1], vec![1]).unwrap_err();
        assert!(matches!(err, TenureError::MalformedSchedule(_)));
    }

    #[test]
    fn rejects_table_length_mismatch() {
        assert!(CampaignSchedule::new(T0, 2 * SECONDS_PER_DAY, vec![1_000], vec![2, 2]).is_err());
        assert!(CampaignSchedule::new(T0, 2 * SECONDS_PER_DAY, vec![1_000, 1_100], vec![2]).is_err());
    }

    #[test]
    fn rejects_zero_entries() {
        assert!(CampaignSchedule::new(T0, SECONDS_PER_DAY, vec![0], vec![2]).is_err());
        assert!(CampaignSchedule::new(T0, SECONDS_PER_DAY, vec![1_000], vec![0]).is_err());
    }

    #[test]
    fn current_day_window_bounds() {
        let s = two_day_schedule();
        assert_eq!(s.current_day(T0 - 1), None);
        assert_eq!(s.current_day(T0), Some(0));
        assert_eq!(s.current_day(T0 + SECONDS_PER_DAY - 1), Some(0));
        assert_eq!(s.current_day(T0 + SECONDS_PER_DAY), Some(1));
        assert_eq!(s.current_day(s.ends_at() - 1), Some(1));
        assert_eq!(s.current_day(s.ends_at()), None);
    }

    #[test]
    fn lookups_are_range_checked() {
        let s = two_day_schedule();
        assert_eq!(s.required_deposit(1).unwrap(), 1_100);
        assert_eq!(s.capacity(0).unwrap(), 2);
        assert!(matches!(
            s.required_deposit(2).unwrap_err(),
            TenureError::DayOutOfRange { got: 2, num_days: 2 }
        ));
    }
}
