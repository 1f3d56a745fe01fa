//! Progress record - one user's attempt at the challenge.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Time, CHALLENGE_DAYS, DEADLINE_SLOTS, UNLOCK_SLOT_MS};

/// Persisted progress for a single user identifier.
///
/// Instants are stored as milliseconds since the Unix epoch and note keys
/// as decimal day numbers, so the JSON shape is
/// `{ currentDay, startTime, completedDays, dayNotes, lastCompletedTime }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Day the user is working on; `CHALLENGE_DAYS + 1` once finished
    pub current_day: u32,

    /// Creation time of the record or of the last reset
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: Time,

    /// Days completed since the last reset
    #[serde(default)]
    pub completed_days: BTreeSet<u32>,

    /// Optional free-text note per completed day
    #[serde(default)]
    pub day_notes: BTreeMap<u32, String>,

    /// When the most recent day was completed
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_completed_time: Option<Time>,
}

/// Rejection of a completion whose day is not the record's current day,
/// or of any completion once the challenge is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid day completion: expected day {expected}, got {got}")]
pub struct DayMismatch {
    /// The record's current day
    pub expected: u32,
    /// The day that was submitted
    pub got: u32,
}

/// A persisted record that cannot describe a real attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRecord {
    /// `current_day` outside `1..=CHALLENGE_DAYS + 1`
    #[error("current day {0} out of range")]
    DayOutOfRange(u32),

    /// `start_time` too close to the end of the time range to schedule
    /// the remaining slots
    #[error("start time out of range")]
    StartOutOfRange,
}

impl ProgressRecord {
    /// A fresh attempt starting at `now`.
    pub fn new(now: Time) -> Self {
        Self {
            current_day: 1,
            start_time: now,
            completed_days: BTreeSet::new(),
            day_notes: BTreeMap::new(),
            last_completed_time: None,
        }
    }

    /// Overwrite this record with a fresh attempt starting at `now`.
    pub fn reset(&mut self, now: Time) {
        *self = Self::new(now);
    }

    /// Whole unlock slots elapsed since `start_time`, rounded down.
    pub fn elapsed_slots(&self, now: Time) -> i64 {
        (now - self.start_time)
            .num_milliseconds()
            .div_euclid(UNLOCK_SLOT_MS)
    }

    /// Whether the attempt ran past the outer deadline without finishing.
    pub fn is_stale(&self, now: Time) -> bool {
        self.elapsed_slots(now) >= DEADLINE_SLOTS && !self.is_challenge_complete()
    }

    /// Whether every stage has been completed.
    pub fn is_challenge_complete(&self) -> bool {
        self.current_day > CHALLENGE_DAYS
    }

    /// Check that the record can be scheduled; stores run this on load.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if !(1..=CHALLENGE_DAYS + 1).contains(&self.current_day) {
            return Err(InvalidRecord::DayOutOfRange(self.current_day));
        }
        let last_slot = i64::from(CHALLENGE_DAYS + 1).max(DEADLINE_SLOTS);
        slots_after(self.start_time, last_slot).ok_or(InvalidRecord::StartOutOfRange)?;
        Ok(())
    }

    /// Instant at which the current day's slot opens, counted in fixed
    /// slots from `start_time` rather than from the last completion.
    pub fn next_unlock_time(&self) -> Time {
        slots_after(self.start_time, i64::from(self.current_day)).unwrap_or(Time::MAX_UTC)
    }

    /// Locked only after at least one completion and before the next slot opens.
    pub fn is_locked(&self, now: Time) -> bool {
        self.last_completed_time.is_some() && now < self.next_unlock_time()
    }

    /// Instant after which an unfinished attempt is reset.
    pub fn deadline(&self) -> Time {
        slots_after(self.start_time, DEADLINE_SLOTS).unwrap_or(Time::MAX_UTC)
    }

    /// Mark `day` complete and advance to the next one.
    ///
    /// The record is left untouched when `day` is not the current day or
    /// the challenge is already finished.
    pub fn complete(&mut self, day: u32, note: Option<&str>, now: Time) -> Result<(), DayMismatch> {
        if day != self.current_day || self.is_challenge_complete() {
            return Err(DayMismatch {
                expected: self.current_day,
                got: day,
            });
        }

        self.completed_days.insert(day);
        if let Some(note) = note.filter(|n| !n.is_empty()) {
            self.day_notes.insert(day, note.to_string());
        }
        self.last_completed_time = Some(now);
        self.current_day = day + 1;
        Ok(())
    }
}

fn slots_after(start: Time, slots: i64) -> Option<Time> {
    let offset = chrono::Duration::try_milliseconds(slots.checked_mul(UNLOCK_SLOT_MS)?)?;
    start.checked_add_signed(offset)
}
