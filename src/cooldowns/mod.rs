//! Cooldown enforcement.
//!
//! Cooldowns are enforced from memory. Those lasting at least
//! [`PERSIST_THRESHOLD_SECS`] are also written to the cooldown repository so
//! they survive a restart.

mod rule;
mod tracker;

pub use rule::{CooldownRule, format_remaining, parse_duration};
pub use tracker::{CooldownTracker, SweepOutcome};

/// Cooldowns at least this long (5 minutes) are persisted.
pub const PERSIST_THRESHOLD_SECS: u64 = 300;
