//! Progress Engine
//!
//! Day sequencing, time-gated unlocks, and the automatic reset of stale
//! attempts, on top of an injected store and clock.

#![warn(missing_docs)]

pub mod engine;
pub mod catalog;
pub mod locks;

pub use engine::{ProgressEngine, ProgressError};
pub use catalog::{CatalogService, CatalogError};
pub use locks::UserLocks;
