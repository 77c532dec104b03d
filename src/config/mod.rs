//! Configuration module.
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::database::models::Prefix;
use crate::database::{MongoOptions, PersistenceConfig};
use crate::error::{Error, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // MongoDB (built-in persistence). No URI means no persistence.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub mongo_options: MongoOptions,

    /// Prefix for guilds without stored settings.
    pub default_prefix: Prefix,

    /// Guild IDs where test-only commands are registered.
    pub test_servers: Vec<String>,

    /// Owner user IDs. These users bypass owner-only checks.
    pub bot_owners: Vec<String>,

    /// Absolute path to command definitions.
    pub commands_dir: Option<PathBuf>,

    /// Absolute path to feature definitions.
    pub features_dir: Option<PathBuf>,

    pub show_warns: bool,
    pub log_commands: bool,

    /// How often running cooldowns are swept and synced to storage.
    pub cooldown_sync_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongodb_uri: None,
            mongodb_database: "guildkit".to_string(),
            mongo_options: MongoOptions::default(),
            default_prefix: Prefix::default(),
            test_servers: Vec::new(),
            bot_owners: Vec::new(),
            commands_dir: None,
            features_dir: None,
            show_warns: true,
            log_commands: false,
            cooldown_sync_interval: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`).
    ///
    /// # Errors
    /// Fails on an empty prefix, a non-absolute directory option or a
    /// malformed numeric option.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let default_prefix = match var("DEFAULT_PREFIX") {
            Some(prefix) => Prefix::new(prefix)?,
            None => defaults.default_prefix,
        };

        let mongo_options = MongoOptions {
            app_name: var("MONGODB_APP_NAME").filter(|s| !s.is_empty()),
            max_pool_size: parse_number("MONGODB_MAX_POOL_SIZE", var("MONGODB_MAX_POOL_SIZE"))?,
            connect_timeout: parse_number(
                "MONGODB_CONNECT_TIMEOUT_SECS",
                var("MONGODB_CONNECT_TIMEOUT_SECS"),
            )?
            .map(Duration::from_secs),
        };
        let cooldown_sync_interval =
            parse_number::<u64>("COOLDOWN_SYNC_SECS", var("COOLDOWN_SYNC_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cooldown_sync_interval);

        let commands_dir = var("COMMANDS_DIR")
            .map(|dir| validate_dir("COMMANDS_DIR", &dir))
            .transpose()?;
        let features_dir = var("FEATURES_DIR")
            .map(|dir| validate_dir("FEATURES_DIR", &dir))
            .transpose()?;

        Ok(Self {
            mongodb_uri: var("MONGODB_URI").filter(|s| !s.is_empty()),
            mongodb_database: var("MONGODB_DATABASE")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.mongodb_database),
            mongo_options,
            default_prefix,
            test_servers: parse_list(var("TEST_SERVERS")),
            bot_owners: parse_list(var("BOT_OWNERS")),
            commands_dir,
            features_dir,
            show_warns: var("SHOW_WARNS")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.show_warns),
            log_commands: var("LOG_COMMANDS")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.log_commands),
            cooldown_sync_interval,
        })
    }

    /// Built-in persistence settings, if a connection string is configured.
    pub fn persistence(&self) -> Option<PersistenceConfig> {
        self.mongodb_uri.as_ref().map(|uri| PersistenceConfig::Mongo {
            uri: uri.clone(),
            database: self.mongodb_database.clone(),
            options: self.mongo_options.clone(),
        })
    }
}

/// Directory options must be absolute paths.
pub fn validate_dir(option: &'static str, value: &str) -> Result<PathBuf> {
    let path = PathBuf::from(value);
    if value.is_empty() || !path.is_absolute() {
        return Err(Error::InvalidConfigurationPath {
            option,
            path: value.to_string(),
        });
    }
    Ok(path)
}

/// Positive number option. Unset or empty means "use the default";
/// anything else that is not a positive number is fatal.
fn parse_number<T>(option: &'static str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match value.parse::<T>() {
        Ok(number) if number > T::default() => Ok(Some(number)),
        _ => Err(Error::InvalidConfigurationValue {
            option,
            value,
        }),
    }
}

// Parse comma-separated IDs
fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
