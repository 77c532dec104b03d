//! Orchestrator.
//!
//! `GuildKit` wires the selected persistence strategy, owns the guild
//! settings cache and the cooldown tracker, and exposes the operations
//! command collaborators call into.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::GuildSettingsCache;
use crate::config::Config;
use crate::cooldowns::{CooldownRule, CooldownTracker};
use crate::database::models::{CooldownQuery, GuildSettings, Prefix};
use crate::database::{
    ConnectionStatus, CooldownRepository, GuildSettingsRepository, PersistenceConfig,
    PersistenceStrategy,
};
use crate::error::{Error, Result};

/// Composition root for guild settings and cooldowns.
pub struct GuildKit {
    default_prefix: Prefix,
    persistence: Option<PersistenceStrategy>,
    settings: GuildSettingsCache,
    cooldowns: CooldownTracker,
    sync_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl GuildKit {
    /// Select the persistence strategy and warm state from it.
    ///
    /// With a backend configured, every stored guild setting is loaded into
    /// the cache and persisted cooldowns are restored before this returns.
    ///
    /// # Errors
    /// Fails if the backend cannot be reached; startup must not continue.
    pub async fn init(config: &Config, persistence: Option<PersistenceConfig>) -> Result<Self> {
        let persistence = match persistence {
            Some(selected) => Some(PersistenceStrategy::select(selected).await?),
            None => {
                info!("No persistence configured, guild settings stay in memory");
                None
            }
        };

        let kit = Self {
            default_prefix: config.default_prefix.clone(),
            persistence,
            settings: GuildSettingsCache::new(),
            cooldowns: CooldownTracker::new(),
            sync_interval: config.cooldown_sync_interval,
            sweeper: Mutex::new(None),
        };

        if kit.persistence.is_some() {
            kit.warm_guild_settings().await?;
            kit.load_cooldowns().await?;
        }

        Ok(kit)
    }

    pub fn default_prefix(&self) -> &Prefix {
        &self.default_prefix
    }

    pub fn is_db_connected(&self) -> bool {
        self.persistence
            .as_ref()
            .is_some_and(PersistenceStrategy::is_connected)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.persistence
            .as_ref()
            .map_or(ConnectionStatus::Disconnected, PersistenceStrategy::connection_status)
    }

    fn strategy(&self, repository: &'static str) -> Result<&PersistenceStrategy> {
        self.persistence
            .as_ref()
            .ok_or(Error::RepositoryNotConfigured(repository))
    }

    /// Guild settings repository of the active strategy.
    ///
    /// # Errors
    /// `RepositoryNotConfigured` without a strategy, `DatabaseNotConnected`
    /// while the backend is down.
    pub fn guild_settings_repository(&self) -> Result<Arc<dyn GuildSettingsRepository>> {
        self.strategy("guild settings repository")?.guild_settings()
    }

    /// Cooldown repository of the active strategy.
    ///
    /// # Errors
    /// Same conditions as [`GuildKit::guild_settings_repository`].
    pub fn cooldown_repository(&self) -> Result<Arc<dyn CooldownRepository>> {
        self.strategy("cooldown repository")?.cooldowns()
    }

    /// Load every stored guild setting into the cache.
    async fn warm_guild_settings(&self) -> Result<usize> {
        let all = self.guild_settings_repository()?.find_all().await?;
        let count = self.settings.warm_all(all);
        info!("Loaded settings for {} guilds", count);
        Ok(count)
    }

    /// Restore persisted cooldowns into the tracker.
    async fn load_cooldowns(&self) -> Result<usize> {
        let repo = self.cooldown_repository()?;
        match repo.find_all().await {
            Ok(stored) => {
                let count = self.cooldowns.restore(&stored)?;
                info!("Restored {} persisted cooldowns", count);
                Ok(count)
            }
            Err(Error::NotImplemented(op)) => {
                warn!("{op} unavailable, persisted cooldowns will not be restored");
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    // ---- guild settings ----

    /// Settings for a guild, created with the default prefix when none are stored.
    ///
    /// Served from the cache after the first access; storage is read at most
    /// once per guild.
    pub async fn get_or_create_guild_settings(&self, guild_id: &str) -> Result<GuildSettings> {
        if let Some(settings) = self.settings.get(guild_id) {
            return Ok(settings);
        }

        let lock = self.settings.lock_for(guild_id);
        let _guard = lock.lock().await;
        self.resolve_locked(guild_id).await
    }

    /// Cache-aside lookup. The caller holds the guild's lock.
    async fn resolve_locked(&self, guild_id: &str) -> Result<GuildSettings> {
        // a concurrent miss may have filled it while we waited
        if let Some(settings) = self.settings.get(guild_id) {
            return Ok(settings);
        }

        let stored = match &self.persistence {
            Some(_) => self.guild_settings_repository()?.find_one(guild_id).await?,
            None => None,
        };

        let settings = stored.unwrap_or_else(|| {
            debug!("No stored settings for guild {}, using defaults", guild_id);
            GuildSettings::new(guild_id, self.default_prefix.clone())
        });
        self.settings.put(settings.clone());
        Ok(settings)
    }

    /// Resolve, mutate, persist, then cache the persisted value.
    ///
    /// Runs under the guild's lock so concurrent mutations of one guild
    /// apply one after another.
    async fn mutate<F>(&self, guild_id: &str, apply: F) -> Result<GuildSettings>
    where
        F: FnOnce(&mut GuildSettings),
    {
        let lock = self.settings.lock_for(guild_id);
        let _guard = lock.lock().await;

        let mut settings = self.resolve_locked(guild_id).await?;
        apply(&mut settings);

        let persisted = match &self.persistence {
            Some(_) => self.guild_settings_repository()?.save(&settings).await?,
            None => settings,
        };
        self.settings.put(persisted.clone());
        Ok(persisted)
    }

    /// Change a guild's prefix. Returns `None` without a guild (e.g. direct messages).
    pub async fn set_prefix(
        &self,
        guild_id: Option<&str>,
        prefix: &str,
    ) -> Result<Option<GuildSettings>> {
        let Some(guild_id) = guild_id else {
            return Ok(None);
        };
        let prefix = Prefix::new(prefix)?;

        let settings = self
            .mutate(guild_id, |settings| settings.set_prefix(prefix))
            .await?;
        info!("Prefix for guild {} set to '{}'", guild_id, settings.prefix());
        Ok(Some(settings))
    }

    /// Register a category (optionally with an emoji) for a guild.
    pub async fn set_category_emoji(
        &self,
        guild_id: Option<&str>,
        category: &str,
        emoji: Option<&str>,
    ) -> Result<Option<GuildSettings>> {
        let Some(guild_id) = guild_id else {
            return Ok(None);
        };

        let settings = self
            .mutate(guild_id, |settings| {
                settings.set_category_emoji(category, emoji.map(str::to_string));
            })
            .await?;
        debug!("Category '{}' updated for guild {}", category, guild_id);
        Ok(Some(settings))
    }

    /// Prefix in effect for a guild, or the default outside guilds.
    pub async fn prefix_for(&self, guild_id: Option<&str>) -> Result<Prefix> {
        match guild_id {
            Some(guild_id) => Ok(self
                .get_or_create_guild_settings(guild_id)
                .await?
                .prefix()
                .clone()),
            None => Ok(self.default_prefix.clone()),
        }
    }

    // ---- cooldowns ----

    /// Start a cooldown for one invocation of a command.
    ///
    /// Long cooldowns are also written to storage when a backend is configured.
    pub async fn start_cooldown(
        &self,
        rule: &CooldownRule,
        command_id: &str,
        guild_id: &str,
        user_id: Option<&str>,
    ) -> Result<()> {
        let cooldown = rule.cooldown(command_id, guild_id, user_id)?;
        let persist = rule.is_persistent() && self.persistence.is_some();

        // Enforced from memory even if the write below fails; the sweep retries it.
        self.cooldowns.start(&cooldown, persist)?;
        debug!(
            "Cooldown {} started for {}s",
            cooldown.identity()?,
            rule.seconds()
        );

        if persist {
            self.cooldown_repository()?.save(&cooldown).await?;
        }
        Ok(())
    }

    /// Seconds left before the command may run again, `None` when it may run now.
    pub fn cooldown_remaining(
        &self,
        rule: &CooldownRule,
        command_id: &str,
        guild_id: &str,
        user_id: Option<&str>,
    ) -> Result<Option<u64>> {
        let query = rule.cooldown(command_id, guild_id, user_id)?.query()?;
        Ok(self.cooldowns.remaining(&query))
    }

    /// Cancel a running cooldown, deleting its stored copy if it has one.
    ///
    /// The stored copy goes first; if that fails the cooldown stays tracked
    /// so a retry deletes it again.
    pub async fn cancel_cooldown(&self, query: &CooldownQuery) -> Result<()> {
        if self.cooldowns.is_persisted(query) == Some(true) {
            self.cooldown_repository()?.delete(query).await?;
        }
        self.cooldowns.cancel(query);
        debug!("Cooldown {} cleared", query.identity());
        Ok(())
    }

    /// Drop expired cooldowns and sync persisted ones with storage.
    ///
    /// Every delete and save is attempted even if one fails; the first error
    /// is returned. Expired cooldowns whose stored copy could not be deleted
    /// are retried on the next sweep.
    pub async fn sweep_cooldowns(&self) -> Result<()> {
        let repo = match &self.persistence {
            Some(_) => Some(self.cooldown_repository()?),
            None => None,
        };

        let outcome = self.cooldowns.sweep();
        let Some(repo) = repo else {
            return Ok(());
        };
        if outcome.expired.is_empty() && outcome.live.is_empty() {
            return Ok(());
        }

        let mut first_error = None;
        let mut deleted = 0;
        for query in &outcome.expired {
            match repo.delete(query).await {
                Ok(()) => {
                    self.cooldowns.clear_expired(query);
                    deleted += 1;
                }
                Err(e) => {
                    warn!("Failed to delete expired cooldown {}: {}", query.identity(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        let mut synced = 0;
        for cooldown in &outcome.live {
            match repo.save(cooldown).await {
                Ok(_) => synced += 1,
                Err(e) => {
                    warn!("Failed to sync cooldown for '{}': {}", cooldown.command_id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        debug!("Cooldown sweep: {} expired, {} synced", deleted, synced);
        first_error.map_or(Ok(()), Err)
    }

    /// Sweep cooldowns periodically until shutdown.
    pub fn spawn_cooldown_sweeper(self: &Arc<Self>) {
        let kit: Weak<Self> = Arc::downgrade(self);
        let period = self.sync_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(strong) = kit.upgrade() else {
                    break;
                };
                if let Err(e) = strong.sweep_cooldowns().await {
                    warn!("Cooldown sweep failed: {}", e);
                }
            }
        });

        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop the sweeper, flush cooldowns one last time and close the backend.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }

        if self.is_db_connected()
            && let Err(e) = self.sweep_cooldowns().await
        {
            warn!("Final cooldown flush failed: {}", e);
        }

        if let Some(persistence) = &self.persistence {
            persistence.shutdown().await;
        }
        info!("GuildKit shut down");
    }
}

impl std::fmt::Debug for GuildKit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildKit")
            .field("default_prefix", &self.default_prefix)
            .field("persistence", &self.persistence)
            .field("cached_guilds", &self.settings.len())
            .field("active_cooldowns", &self.cooldowns.len())
            .finish()
    }
}
