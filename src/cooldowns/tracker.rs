//! In-memory cooldown tracker.
//!
//! Active cooldowns are keyed by their lookup key and expire lazily on
//! lookup or during a sweep. Long cooldowns are flagged as persisted so the
//! orchestrator keeps their stored copy in sync. An expired persisted entry
//! stays until its stored copy is confirmed deleted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::database::models::{Cooldown, CooldownQuery};
use crate::error::Result;

#[derive(Debug, Clone)]
struct ActiveCooldown {
    cooldown: Cooldown,
    expires_at: DateTime<Utc>,
    persisted: bool,
}

impl ActiveCooldown {
    fn remaining_at(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.expires_at - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            // round up so a running cooldown never reports 0
            (millis as u64).div_ceil(1000)
        }
    }
}

/// Result of a sweep over persisted cooldowns.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Persisted cooldowns that ran out and must be deleted from storage.
    /// They stay tracked until [`CooldownTracker::clear_expired`] is called.
    pub expired: Vec<CooldownQuery>,
    /// Persisted cooldowns still running, with refreshed remaining time.
    pub live: Vec<Cooldown>,
}

/// Active cooldowns for this process (lock-free).
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    entries: Arc<DashMap<CooldownQuery, ActiveCooldown>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a cooldown running for its `seconds_remaining`.
    pub fn start(&self, cooldown: &Cooldown, persisted: bool) -> Result<()> {
        self.start_at(cooldown, persisted, Utc::now())
    }

    pub(crate) fn start_at(
        &self,
        cooldown: &Cooldown,
        persisted: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let key = cooldown.query()?;
        let seconds = i64::try_from(cooldown.seconds_remaining).unwrap_or(i64::MAX);
        let expires_at = Duration::try_seconds(seconds)
            .and_then(|length| now.checked_add_signed(length))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries.insert(
            key,
            ActiveCooldown {
                cooldown: cooldown.clone(),
                expires_at,
                persisted,
            },
        );
        Ok(())
    }

    /// Seconds left on a running cooldown, `None` when not on cooldown.
    pub fn remaining(&self, query: &CooldownQuery) -> Option<u64> {
        self.remaining_at(query, Utc::now())
    }

    pub(crate) fn remaining_at(&self, query: &CooldownQuery, now: DateTime<Utc>) -> Option<u64> {
        let remaining = self.entries.get(query)?.remaining_at(now);
        if remaining > 0 {
            return Some(remaining);
        }
        // Persisted entries stay until the sweep deletes their stored copy.
        self.entries
            .remove_if(query, |_, entry| !entry.persisted && entry.remaining_at(now) == 0);
        None
    }

    /// Whether a tracked cooldown has a stored copy, `None` when not tracked.
    pub fn is_persisted(&self, query: &CooldownQuery) -> Option<bool> {
        self.entries.get(query).map(|entry| entry.persisted)
    }

    /// Stop a cooldown. Returns whether it had a persisted copy.
    pub fn cancel(&self, query: &CooldownQuery) -> Option<bool> {
        self.entries.remove(query).map(|(_, entry)| entry.persisted)
    }

    /// Forget an expired cooldown once its stored copy is gone.
    ///
    /// A cooldown restarted since the sweep is left alone.
    pub fn clear_expired(&self, query: &CooldownQuery) -> bool {
        self.clear_expired_at(query, Utc::now())
    }

    pub(crate) fn clear_expired_at(&self, query: &CooldownQuery, now: DateTime<Utc>) -> bool {
        self.entries
            .remove_if(query, |_, entry| entry.remaining_at(now) == 0)
            .is_some()
    }

    /// Load cooldowns read back from storage.
    pub fn restore(&self, cooldowns: &[Cooldown]) -> Result<usize> {
        let now = Utc::now();
        let mut restored = 0;
        for cooldown in cooldowns.iter().filter(|c| c.seconds_remaining > 0) {
            self.start_at(cooldown, true, now)?;
            restored += 1;
        }
        Ok(restored)
    }

    /// Drop expired cooldowns and report what storage needs to hear about.
    pub fn sweep(&self) -> SweepOutcome {
        self.sweep_at(Utc::now())
    }

    pub(crate) fn sweep_at(&self, now: DateTime<Utc>) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        // expired entries without a stored copy just go
        self.entries
            .retain(|_, entry| entry.persisted || entry.remaining_at(now) > 0);

        for entry in self.entries.iter().filter(|e| e.persisted) {
            let remaining = entry.remaining_at(now);
            if remaining == 0 {
                outcome.expired.push(entry.key().clone());
            } else {
                let mut cooldown = entry.cooldown.clone();
                cooldown.seconds_remaining = remaining;
                outcome.live.push(cooldown);
            }
        }

        outcome
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
