//! Guild settings model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Command prefix. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(String);

impl Prefix {
    /// Validate and wrap a prefix.
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::InvalidPrefix);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Self("!".to_string())
    }
}

impl TryFrom<String> for Prefix {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One guild's configurable state.
///
/// Stored as `{ _id: guildId, prefix, categories }`, one document per guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    /// Guild ID, doubles as the document identity.
    #[serde(rename = "_id")]
    guild_id: String,

    prefix: Prefix,

    /// Category name -> emoji (None when registered without one).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    categories: BTreeMap<String, Option<String>>,
}

impl GuildSettings {
    /// Create settings for a guild with no stored record.
    pub fn new(guild_id: impl Into<String>, prefix: Prefix) -> Self {
        Self {
            guild_id: guild_id.into(),
            prefix,
            categories: BTreeMap::new(),
        }
    }

    pub fn guild_id(&self) -> &str {
        &self.guild_id
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn set_prefix(&mut self, prefix: Prefix) {
        self.prefix = prefix;
    }

    /// Emoji registered for a category.
    ///
    /// Outer `None` means the category is not registered at all.
    pub fn category_emoji(&self, category: &str) -> Option<Option<&str>> {
        self.categories.get(category).map(|emoji| emoji.as_deref())
    }

    /// Register a category, optionally with an emoji. Returns the previous emoji registration.
    pub fn set_category_emoji(
        &mut self,
        category: impl Into<String>,
        emoji: Option<String>,
    ) -> Option<Option<String>> {
        let emoji = emoji.filter(|e| !e.trim().is_empty());
        self.categories.insert(category.into(), emoji)
    }

    /// Unregister a category.
    pub fn remove_category(&mut self, category: &str) -> bool {
        self.categories.remove(category).is_some()
    }

    pub fn categories(&self) -> &BTreeMap<String, Option<String>> {
        &self.categories
    }
}
