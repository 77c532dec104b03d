//! Guild settings cache.
//!
//! Cache-aside store for [`GuildSettings`], owned by the orchestrator.
//! Entries never expire: each guild is read from storage at most once per
//! process lifetime. Mutations for one guild are serialized through a
//! per-guild async lock; different guilds never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CacheConfig, TypedCache};
use crate::database::models::GuildSettings;

#[derive(Debug)]
pub struct GuildSettingsCache {
    entries: TypedCache<String, GuildSettings>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl GuildSettingsCache {
    pub fn new() -> Self {
        Self {
            entries: TypedCache::new("guild_settings", CacheConfig::persistent()),
            locks: DashMap::new(),
        }
    }

    pub fn get(&self, guild_id: &str) -> Option<GuildSettings> {
        self.entries.get(guild_id)
    }

    /// Insert or replace the entry for the settings' guild.
    pub fn put(&self, settings: GuildSettings) {
        self.entries.insert(settings.guild_id().to_string(), settings);
    }

    /// Bulk insert at startup. Returns how many entries were loaded.
    pub fn warm_all(&self, all: Vec<GuildSettings>) -> usize {
        let count = all.len();
        for settings in all {
            self.put(settings);
        }
        debug!("Warmed guild settings cache with {} entries", count);
        count
    }

    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock serializing reads-on-miss and mutations for one guild.
    pub fn lock_for(&self, guild_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(guild_id) {
            return Arc::clone(lock.value());
        }
        Arc::clone(
            self.locks
                .entry(guild_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}

impl Default for GuildSettingsCache {
    fn default() -> Self {
        Self::new()
    }
}
