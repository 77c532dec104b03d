//! Shared test doubles: in-memory stores that count the I/O they receive.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use guildkit::database::repository::{MemoryCooldownRepository, MemoryGuildSettingsRepository};
use guildkit::{
    Config, ConnectionStatus, Cooldown, CooldownQuery, CooldownRepository, CustomPersistence,
    GuildKit, GuildSettings, GuildSettingsRepository, ManualProbe, PersistenceConfig, Prefix,
    Result,
};

#[derive(Debug, Default)]
pub struct Calls {
    pub find_one: AtomicUsize,
    pub find_all: AtomicUsize,
    pub save: AtomicUsize,
    pub delete: AtomicUsize,
}

impl Calls {
    pub fn find_one(&self) -> usize {
        self.find_one.load(Ordering::SeqCst)
    }

    pub fn find_all(&self) -> usize {
        self.find_all.load(Ordering::SeqCst)
    }

    pub fn save(&self) -> usize {
        self.save.load(Ordering::SeqCst)
    }

    pub fn delete(&self) -> usize {
        self.delete.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.find_one() + self.find_all() + self.save() + self.delete()
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

#[derive(Default)]
pub struct CountingGuildSettings {
    pub inner: MemoryGuildSettingsRepository,
    pub calls: Calls,
}

#[async_trait]
impl GuildSettingsRepository for CountingGuildSettings {
    async fn find_one(&self, guild_id: &str) -> Result<Option<GuildSettings>> {
        bump(&self.calls.find_one);
        // give other tasks a chance to interleave
        tokio::task::yield_now().await;
        self.inner.find_one(guild_id).await
    }

    async fn find_all(&self) -> Result<Vec<GuildSettings>> {
        bump(&self.calls.find_all);
        self.inner.find_all().await
    }

    async fn save(&self, settings: &GuildSettings) -> Result<GuildSettings> {
        bump(&self.calls.save);
        tokio::task::yield_now().await;
        self.inner.save(settings).await
    }

    async fn delete(&self, guild_id: &str) -> Result<()> {
        bump(&self.calls.delete);
        self.inner.delete(guild_id).await
    }
}

#[derive(Default)]
pub struct CountingCooldowns {
    pub inner: MemoryCooldownRepository,
    pub calls: Calls,
}

#[async_trait]
impl CooldownRepository for CountingCooldowns {
    async fn find_one(&self, query: &CooldownQuery) -> Result<Option<Cooldown>> {
        bump(&self.calls.find_one);
        self.inner.find_one(query).await
    }

    async fn find_all(&self) -> Result<Vec<Cooldown>> {
        bump(&self.calls.find_all);
        self.inner.find_all().await
    }

    async fn save(&self, cooldown: &Cooldown) -> Result<Cooldown> {
        bump(&self.calls.save);
        self.inner.save(cooldown).await
    }

    async fn delete(&self, query: &CooldownQuery) -> Result<()> {
        bump(&self.calls.delete);
        self.inner.delete(query).await
    }
}

/// Cooldown store that can write but never read back.
#[derive(Default)]
pub struct WriteOnlyCooldowns {
    pub calls: Calls,
}

#[async_trait]
impl CooldownRepository for WriteOnlyCooldowns {
    async fn save(&self, cooldown: &Cooldown) -> Result<Cooldown> {
        bump(&self.calls.save);
        Ok(cooldown.clone())
    }

    async fn delete(&self, _query: &CooldownQuery) -> Result<()> {
        bump(&self.calls.delete);
        Ok(())
    }
}

pub struct Harness {
    pub kit: Arc<GuildKit>,
    pub probe: Arc<ManualProbe>,
    pub settings: Arc<CountingGuildSettings>,
    pub cooldowns: Arc<CountingCooldowns>,
}

pub fn config(default_prefix: &str) -> Config {
    Config {
        default_prefix: Prefix::new(default_prefix).unwrap(),
        ..Config::default()
    }
}

pub fn custom(
    probe: &Arc<ManualProbe>,
    settings: &Arc<CountingGuildSettings>,
    cooldowns: Arc<dyn CooldownRepository>,
) -> PersistenceConfig {
    PersistenceConfig::Custom(CustomPersistence::new(
        probe.clone(),
        settings.clone(),
        cooldowns,
    ))
}

/// Connected kit over counting in-memory stores, seeded with `stored` settings.
pub async fn harness(default_prefix: &str, stored: Vec<GuildSettings>) -> Harness {
    let probe = Arc::new(ManualProbe::new(ConnectionStatus::Connected));
    let settings = Arc::new(CountingGuildSettings {
        inner: MemoryGuildSettingsRepository::with_documents(stored),
        calls: Calls::default(),
    });
    let cooldowns = Arc::new(CountingCooldowns::default());

    let kit = GuildKit::init(
        &config(default_prefix),
        Some(custom(&probe, &settings, cooldowns.clone())),
    )
    .await
    .expect("kit init");

    Harness {
        kit: Arc::new(kit),
        probe,
        settings,
        cooldowns,
    }
}

pub fn settings(guild_id: &str, prefix: &str) -> GuildSettings {
    GuildSettings::new(guild_id, Prefix::new(prefix).unwrap())
}
