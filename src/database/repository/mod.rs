//! Repository contracts and their implementations.
//!
//! The traits know nothing about storage technology. `save` is an upsert and
//! `delete` of a missing key is a no-op.

mod cooldown_repository;
mod guild_settings_repository;
mod memory;

use async_trait::async_trait;

use crate::database::models::{Cooldown, CooldownQuery, GuildSettings};
use crate::error::{Error, Result};

pub use cooldown_repository::{CooldownDocument, MongoCooldownRepository};
pub use guild_settings_repository::MongoGuildSettingsRepository;
pub use memory::{MemoryCooldownRepository, MemoryGuildSettingsRepository};

/// Storage for per-guild settings.
#[async_trait]
pub trait GuildSettingsRepository: Send + Sync {
    async fn find_one(&self, guild_id: &str) -> Result<Option<GuildSettings>>;

    /// Every stored guild. Used once at startup to warm the cache.
    async fn find_all(&self) -> Result<Vec<GuildSettings>>;

    /// Upsert, returning the persisted value.
    async fn save(&self, settings: &GuildSettings) -> Result<GuildSettings>;

    async fn delete(&self, guild_id: &str) -> Result<()>;
}

/// Storage for cooldown counters.
///
/// Lookups default to [`Error::NotImplemented`] so a backend that cannot
/// read cooldowns back fails loudly instead of reporting "not found".
#[async_trait]
pub trait CooldownRepository: Send + Sync {
    async fn find_one(&self, _query: &CooldownQuery) -> Result<Option<Cooldown>> {
        Err(Error::NotImplemented("CooldownRepository::find_one"))
    }

    async fn find_all(&self) -> Result<Vec<Cooldown>> {
        Err(Error::NotImplemented("CooldownRepository::find_all"))
    }

    /// Upsert keyed by the derived identity, returning the persisted value.
    async fn save(&self, cooldown: &Cooldown) -> Result<Cooldown>;

    async fn delete(&self, query: &CooldownQuery) -> Result<()>;
}
