//! Progress engine - the challenge state machine.

use std::sync::Arc;

use seven_core::{Clock, CompletionOutcome, ProgressRecord, ProgressView, SystemClock};
use seven_storage::{Storage, StorageError};
use tracing::{debug, info, warn};

use crate::locks::UserLocks;

/// Errors returned by [`ProgressEngine`].
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// No record exists for the user
    #[error("user not found: {0}")]
    NotFound(String),

    /// The submitted day is not the user's current day
    #[error("invalid day completion: expected day {expected}, got {got}")]
    InvalidDay {
        /// The record's current day
        expected: u32,
        /// The day that was submitted
        got: u32,
    },

    /// Store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Drives per-user progress records through the challenge.
///
/// Records are read and written through the injected [`Storage`]; the
/// current time comes from the injected [`Clock`]. Every operation holds
/// the user's lock for its whole read-modify-write cycle.
#[derive(Clone)]
pub struct ProgressEngine {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    locks: UserLocks,
}

impl ProgressEngine {
    /// Create an engine on the wall clock.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            locks: UserLocks::new(),
        }
    }

    /// Use a different clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the user's record, creating it on first access, and reset it if
    /// the attempt ran past the outer deadline.
    pub async fn get_or_init(&self, user_id: &str) -> Result<ProgressView, ProgressError> {
        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();

        let record = match self.storage.load_record(user_id).await? {
            Some(mut record) => {
                if record.is_stale(now) {
                    info!(
                        "User {} exceeded time limit on day {} - resetting",
                        user_id, record.current_day
                    );
                    record.reset(now);
                    self.storage.save_record(user_id, &record).await?;
                }
                record
            }
            None => {
                info!("Creating new user: {}", user_id);
                let record = ProgressRecord::new(now);
                self.storage.save_record(user_id, &record).await?;
                record
            }
        };

        let view = ProgressView::at(record, now);
        debug!(
            "User {} on day {} (locked: {}, complete: {})",
            user_id, view.record.current_day, view.is_locked, view.challenge_complete
        );
        Ok(view)
    }

    /// Complete `day` for the user and advance to the next day.
    ///
    /// An attempt past the outer deadline is reset first, so the day is
    /// checked against the fresh record. A replay of an already-completed
    /// day fails with `InvalidDay`, the same as any other mismatch.
    pub async fn complete_day(
        &self,
        user_id: &str,
        day: u32,
        note: Option<&str>,
    ) -> Result<CompletionOutcome, ProgressError> {
        let _guard = self.locks.acquire(user_id).await;
        let now = self.clock.now();

        let mut record = self
            .storage
            .load_record(user_id)
            .await?
            .ok_or_else(|| ProgressError::NotFound(user_id.to_string()))?;

        if record.is_stale(now) {
            info!(
                "User {} exceeded time limit on day {} - resetting",
                user_id, record.current_day
            );
            record.reset(now);
            self.storage.save_record(user_id, &record).await?;
        }

        if let Err(mismatch) = record.complete(day, note, now) {
            warn!(
                "Invalid day for {}: expected {}, got {}",
                user_id, mismatch.expected, mismatch.got
            );
            return Err(ProgressError::InvalidDay {
                expected: mismatch.expected,
                got: mismatch.got,
            });
        }

        self.storage.save_record(user_id, &record).await?;

        let outcome = CompletionOutcome::of(&record);
        info!(
            "Day {} completed for {} (challenge complete: {})",
            day, user_id, outcome.challenge_complete
        );
        Ok(outcome)
    }

    /// Overwrite the user's record with a fresh attempt starting now.
    pub async fn reset_progress(&self, user_id: &str) -> Result<(), ProgressError> {
        let _guard = self.locks.acquire(user_id).await;
        let record = ProgressRecord::new(self.clock.now());
        self.storage.save_record(user_id, &record).await?;
        info!("User {} reset successfully", user_id);
        Ok(())
    }
}
