//! Cooldown model and identity derivation.
//!
//! Stored identities are `command-guild` for global cooldowns and
//! `command-guild-user` for per-user cooldowns. Guild and user ids are
//! platform snowflakes and never contain the separator, so stored ids are
//! split from the right.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator between identity segments.
pub const IDENTITY_SEPARATOR: char = '-';

/// Who a cooldown applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CooldownScope {
    /// Everyone in the guild shares one counter.
    Global,
    /// Each user in the guild has their own counter.
    PerUser,
}

impl CooldownScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerUser => "per-user",
        }
    }
}

impl FromStr for CooldownScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Self::Global),
            "per-user" => Ok(Self::PerUser),
            other => Err(Error::UnrecognizedCooldownScope(other.to_string())),
        }
    }
}

impl TryFrom<String> for CooldownScope {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CooldownScope> for String {
    fn from(scope: CooldownScope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for CooldownScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the storage identity of a cooldown.
///
/// The user id only takes part for per-user scope, where it is required.
pub fn derive_identity(
    command_id: &str,
    guild_id: &str,
    user_id: Option<&str>,
    scope: CooldownScope,
) -> Result<String> {
    match scope {
        CooldownScope::Global => Ok(format!("{command_id}{IDENTITY_SEPARATOR}{guild_id}")),
        CooldownScope::PerUser => {
            let user_id = user_id.ok_or_else(|| Error::CooldownUserRequired {
                command_id: command_id.to_string(),
            })?;
            Ok(format!(
                "{command_id}{IDENTITY_SEPARATOR}{guild_id}{IDENTITY_SEPARATOR}{user_id}"
            ))
        }
    }
}

/// Split a stored identity back into its key fields.
pub fn parse_identity(identity: &str, scope: CooldownScope) -> Result<CooldownQuery> {
    let malformed = || Error::MalformedIdentity(identity.to_string());

    let (head, user_id) = match scope {
        CooldownScope::Global => (identity, None),
        CooldownScope::PerUser => {
            let (head, user) = identity.rsplit_once(IDENTITY_SEPARATOR).ok_or_else(malformed)?;
            (head, Some(user.to_string()))
        }
    };
    let (command_id, guild_id) = head.rsplit_once(IDENTITY_SEPARATOR).ok_or_else(malformed)?;

    if command_id.is_empty() || guild_id.is_empty() || user_id.as_deref() == Some("") {
        return Err(malformed());
    }

    Ok(CooldownQuery {
        command_id: command_id.to_string(),
        guild_id: guild_id.to_string(),
        user_id,
    })
}

/// Lookup key for a cooldown. Scope is inferred from whether `user_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownQuery {
    pub command_id: String,
    pub guild_id: String,
    pub user_id: Option<String>,
}

impl CooldownQuery {
    pub fn global(command_id: impl Into<String>, guild_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            guild_id: guild_id.into(),
            user_id: None,
        }
    }

    pub fn per_user(
        command_id: impl Into<String>,
        guild_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            guild_id: guild_id.into(),
            user_id: Some(user_id.into()),
        }
    }

    pub fn scope(&self) -> CooldownScope {
        if self.user_id.is_some() {
            CooldownScope::PerUser
        } else {
            CooldownScope::Global
        }
    }

    pub fn identity(&self) -> String {
        match &self.user_id {
            Some(user_id) => format!(
                "{}{IDENTITY_SEPARATOR}{}{IDENTITY_SEPARATOR}{user_id}",
                self.command_id, self.guild_id
            ),
            None => format!("{}{IDENTITY_SEPARATOR}{}", self.command_id, self.guild_id),
        }
    }
}

/// One throttling counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooldown {
    pub command_id: String,
    pub guild_id: String,
    pub user_id: Option<String>,
    pub scope: CooldownScope,
    pub seconds_remaining: u64,
}

impl Cooldown {
    pub fn new(
        command_id: impl Into<String>,
        guild_id: impl Into<String>,
        user_id: Option<String>,
        scope: CooldownScope,
        seconds_remaining: u64,
    ) -> Self {
        Self {
            command_id: command_id.into(),
            guild_id: guild_id.into(),
            user_id,
            scope,
            seconds_remaining,
        }
    }

    pub fn global(
        command_id: impl Into<String>,
        guild_id: impl Into<String>,
        seconds_remaining: u64,
    ) -> Self {
        Self::new(command_id, guild_id, None, CooldownScope::Global, seconds_remaining)
    }

    pub fn per_user(
        command_id: impl Into<String>,
        guild_id: impl Into<String>,
        user_id: impl Into<String>,
        seconds_remaining: u64,
    ) -> Self {
        Self::new(
            command_id,
            guild_id,
            Some(user_id.into()),
            CooldownScope::PerUser,
            seconds_remaining,
        )
    }

    /// Storage identity. Fails for a per-user cooldown without a user.
    pub fn identity(&self) -> Result<String> {
        derive_identity(
            &self.command_id,
            &self.guild_id,
            self.user_id.as_deref(),
            self.scope,
        )
    }

    /// Lookup key matching this cooldown's identity.
    pub fn query(&self) -> Result<CooldownQuery> {
        let user_id = match self.scope {
            CooldownScope::Global => None,
            CooldownScope::PerUser => Some(self.user_id.clone().ok_or_else(|| {
                Error::CooldownUserRequired {
                    command_id: self.command_id.clone(),
                }
            })?),
        };
        Ok(CooldownQuery {
            command_id: self.command_id.clone(),
            guild_id: self.guild_id.clone(),
            user_id,
        })
    }
}
