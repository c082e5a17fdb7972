use chrono::{DateTime, FixedOffset, Utc};

/// Calendar-day boundary detection for quota resets.
///
/// The quota window is a calendar date in a configured reference timezone,
/// not a rolling 24 hours: a user who exhausts their quota at 23:59 gets a
/// fresh allowance at 00:01. The reference timezone defaults to UTC.
#[derive(Debug, Clone, Copy)]
pub struct DailyResetPolicy {
    offset: FixedOffset,
}

impl DailyResetPolicy {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// True when `last_reset_at` and `now` fall on different calendar dates
    /// in the reference timezone
    pub fn should_reset(&self, last_reset_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let last_date = last_reset_at.with_timezone(&self.offset).date_naive();
        let current_date = now.with_timezone(&self.offset).date_naive();
        last_date != current_date
    }
}
