//! Cooldown rules declared by command definitions.

use crate::database::models::{Cooldown, CooldownScope};
use crate::error::{Error, Result};

use super::PERSIST_THRESHOLD_SECS;

/// A command's cooldown: who it applies to and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRule {
    scope: CooldownScope,
    seconds: u64,
}

impl CooldownRule {
    /// Parse a rule from its declared scope and duration, e.g. `("per-user", "30s")`.
    ///
    /// The scope is validated first; an unknown scope is a configuration
    /// error regardless of the duration.
    pub fn new(scope: &str, duration: &str) -> Result<Self> {
        let scope: CooldownScope = scope.parse()?;
        let seconds = parse_duration(duration)?;
        Ok(Self { scope, seconds })
    }

    pub fn from_seconds(scope: CooldownScope, seconds: u64) -> Result<Self> {
        if seconds == 0 {
            return Err(Error::InvalidCooldownDuration("0s".to_string()));
        }
        Ok(Self { scope, seconds })
    }

    pub fn scope(&self) -> CooldownScope {
        self.scope
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Whether cooldowns of this length outlive a restart.
    pub fn is_persistent(&self) -> bool {
        self.seconds >= PERSIST_THRESHOLD_SECS
    }

    /// Full-length cooldown for one invocation.
    pub fn cooldown(&self, command_id: &str, guild_id: &str, user_id: Option<&str>) -> Result<Cooldown> {
        let user_id = match self.scope {
            CooldownScope::Global => None,
            CooldownScope::PerUser => Some(
                user_id
                    .ok_or_else(|| Error::CooldownUserRequired {
                        command_id: command_id.to_string(),
                    })?
                    .to_string(),
            ),
        };
        Ok(Cooldown::new(
            command_id,
            guild_id,
            user_id,
            self.scope,
            self.seconds,
        ))
    }
}

/// Parse duration string (e.g., "30s", "5m", "2h", "1d") into seconds.
///
/// Supported units:
/// - s: seconds
/// - m: minutes
/// - h: hours
/// - d: days
pub fn parse_duration(input: &str) -> Result<u64> {
    let invalid = || Error::InvalidCooldownDuration(input.to_string());
    let trimmed = input.trim();

    let (idx, unit) = trimmed.char_indices().last().ok_or_else(invalid)?;
    let digits = &trimmed[..idx];
    // plain digits only; `parse` alone would take a leading `+`
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return Err(invalid()),
    };

    amount.checked_mul(multiplier).ok_or_else(invalid)
}

/// Human-readable remaining time, e.g. `1h 5m`.
pub fn format_remaining(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let mins = secs / 60;
        let rest = secs % 60;
        if rest > 0 {
            format!("{}m {}s", mins, rest)
        } else {
            format!("{}m", mins)
        }
    } else if secs < 86400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    } else {
        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), 30);
        assert_eq!(parse_duration("5m").unwrap(), 300);
        assert_eq!(parse_duration(" 2h ").unwrap(), 7200);
        assert_eq!(parse_duration("1d").unwrap(), 86400);

        for bad in ["", "s", "10", "0m", "-5m", "+5m", " +5m", "5 m", "5w", "5é", "1.5h"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::InvalidCooldownDuration(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_unknown_scope_wins_over_bad_duration() {
        assert!(matches!(
            CooldownRule::new("perGuild", "not-a-duration"),
            Err(Error::UnrecognizedCooldownScope(_))
        ));
    }

    #[test]
    fn test_rule_builds_cooldowns() {
        let rule = CooldownRule::new("per-user", "10m").unwrap();
        assert!(rule.is_persistent());
        assert_eq!(
            rule.cooldown("ban", "g1", Some("u1")).unwrap(),
            Cooldown::per_user("ban", "g1", "u1", 600)
        );
        assert!(matches!(
            rule.cooldown("ban", "g1", None),
            Err(Error::CooldownUserRequired { .. })
        ));

        let rule = CooldownRule::new("global", "30s").unwrap();
        assert!(!rule.is_persistent());
        assert_eq!(
            rule.cooldown("ban", "g1", Some("u1")).unwrap(),
            Cooldown::global("ban", "g1", 30)
        );
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(42), "42s");
        assert_eq!(format_remaining(300), "5m");
        assert_eq!(format_remaining(305), "5m 5s");
        assert_eq!(format_remaining(3900), "1h 5m");
        assert_eq!(format_remaining(90000), "1d 1h");
    }
}
