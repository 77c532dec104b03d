//! Database models.

pub mod cooldown;
pub mod guild_settings;

pub use cooldown::{
    Cooldown, CooldownQuery, CooldownScope, IDENTITY_SEPARATOR, derive_identity, parse_identity,
};
pub use guild_settings::{GuildSettings, Prefix};
