//! Derived views returned to callers.

use serde::Serialize;

use crate::record::ProgressRecord;
use crate::Time;

/// A record together with its time-derived state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    /// The stored record
    #[serde(flatten)]
    pub record: ProgressRecord,

    /// Whether the next day is still gated by its unlock slot
    pub is_locked: bool,

    /// When the next day opens; only set while locked
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub next_unlock_time: Option<Time>,

    /// Whether every stage has been completed
    pub challenge_complete: bool,

    /// When an unfinished attempt will be reset
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub deadline: Time,
}

impl ProgressView {
    /// Derive the view of `record` as seen at `now`.
    pub fn at(record: ProgressRecord, now: Time) -> Self {
        let is_locked = record.is_locked(now);
        Self {
            is_locked,
            next_unlock_time: is_locked.then(|| record.next_unlock_time()),
            challenge_complete: record.is_challenge_complete(),
            deadline: record.deadline(),
            record,
        }
    }
}

/// Result of a successful day completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    /// The new current day
    pub current_day: u32,

    /// When the new current day opens; absent once the challenge is complete
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub next_unlock_time: Option<Time>,

    /// Whether the completion finished the challenge
    pub challenge_complete: bool,
}

impl CompletionOutcome {
    /// Outcome for a record that has just been advanced.
    pub fn of(record: &ProgressRecord) -> Self {
        let challenge_complete = record.is_challenge_complete();
        Self {
            current_day: record.current_day,
            next_unlock_time: (!challenge_complete).then(|| record.next_unlock_time()),
            challenge_complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Time {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_view_hides_unlock_time_when_unlocked() {
        let view = ProgressView::at(ProgressRecord::new(t0()), t0());
        assert!(!view.is_locked);
        assert!(view.next_unlock_time.is_none());
        assert!(!view.challenge_complete);
    }

    #[test]
    fn test_view_reports_unlock_time_when_locked() {
        let mut record = ProgressRecord::new(t0());
        record.complete(1, None, t0()).unwrap();
        let view = ProgressView::at(record, t0() + Duration::hours(2));
        assert!(view.is_locked);
        assert_eq!(view.next_unlock_time, Some(t0() + Duration::hours(20)));
    }

    #[test]
    fn test_view_renders_flat_json() {
        let view = ProgressView::at(ProgressRecord::new(t0()), t0());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["currentDay"], 1);
        assert_eq!(json["isLocked"], false);
        assert!(json["nextUnlockTime"].is_null());
        assert_eq!(json["deadline"], 1_700_000_000_000i64 + 70 * 3_600_000);
    }

    #[test]
    fn test_outcome_after_last_day() {
        let mut record = ProgressRecord::new(t0());
        for day in 1..=7 {
            record.complete(day, None, t0()).unwrap();
        }
        let outcome = CompletionOutcome::of(&record);
        assert_eq!(outcome.current_day, 8);
        assert!(outcome.challenge_complete);
        assert!(outcome.next_unlock_time.is_none());
    }
}
