//! Guildkit - per-guild settings and command cooldowns for chat bots.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Models, repository contracts, MongoDB and in-memory stores,
//!   persistence strategy selection
//! - `cache` - Moka-backed guild settings cache
//! - `cooldowns` - Cooldown rules and the in-memory tracker
//! - `kit` - `GuildKit`, the orchestrator collaborators call into

pub mod cache;
pub mod config;
pub mod cooldowns;
pub mod database;
pub mod error;
pub mod kit;

pub use config::Config;
pub use cooldowns::CooldownRule;
pub use database::models::{
    Cooldown, CooldownQuery, CooldownScope, GuildSettings, Prefix,
};
pub use database::{
    ConnectionProbe, ConnectionStatus, CooldownRepository, CustomPersistence,
    GuildSettingsRepository, ManualProbe, PersistenceConfig,
};
pub use error::{Error, Result};
pub use kit::GuildKit;
