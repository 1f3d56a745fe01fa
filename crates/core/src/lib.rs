//! Seven core data models.
//!
//! This crate defines the per-user progress record, the pure transitions
//! that drive it through the seven-day challenge, and the task catalog.

#![warn(missing_docs)]

// Progress state
mod record;
mod view;

// Catalog and time
mod catalog;
mod clock;

// Re-exports
pub use record::{DayMismatch, InvalidRecord, ProgressRecord};
pub use view::{CompletionOutcome, ProgressView};
pub use catalog::{CatalogKeyError, TaskCatalog};
pub use clock::{Clock, ManualClock, SystemClock};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Number of stages in the challenge.
pub const CHALLENGE_DAYS: u32 = 7;

/// Length of one unlock slot (one "challenge day") in hours.
pub const UNLOCK_SLOT_HOURS: i64 = 10;

/// Length of one unlock slot in milliseconds.
pub const UNLOCK_SLOT_MS: i64 = UNLOCK_SLOT_HOURS * 60 * 60 * 1000;

/// Number of whole slots after which an unfinished attempt is reset.
pub const DEADLINE_SLOTS: i64 = 7;
