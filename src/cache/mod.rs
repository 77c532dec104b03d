//! Cache module - in-memory caching using Moka.
//!
//! - `TypedCache` - typed wrapper over a Moka cache
//! - `CacheConfig` - capacity and expiry settings
//! - `GuildSettingsCache` - cache-aside store for guild settings

mod config;
mod guild_settings;
mod typed;

pub use config::CacheConfig;
pub use guild_settings::GuildSettingsCache;
pub use typed::TypedCache;
