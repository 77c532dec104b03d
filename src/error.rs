//! Error types shared by every layer of the crate.

/// Errors raised by the settings/cooldown core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation is declared by a repository but the backend has no
    /// working implementation for it. Never a stand-in for "not found".
    #[error("{0} is not implemented by this backend")]
    NotImplemented(&'static str),

    /// A cooldown scope string is neither `global` nor `per-user`.
    #[error("unrecognized cooldown scope '{0}' (expected 'global' or 'per-user')")]
    UnrecognizedCooldownScope(String),

    /// A per-user cooldown was built without a user id.
    #[error("per-user cooldown for command '{command_id}' requires a user id")]
    CooldownUserRequired { command_id: String },

    /// A cooldown duration string could not be parsed.
    #[error("invalid cooldown duration '{0}' (expected e.g. 30s, 5m, 2h, 1d)")]
    InvalidCooldownDuration(String),

    #[error("database not connected")]
    DatabaseNotConnected,

    /// A repository was requested but no persistence strategy is configured.
    #[error("{0} is not configured: no persistence strategy selected")]
    RepositoryNotConfigured(&'static str),

    /// A directory-style option is not an absolute path.
    #[error("configuration option {option} must be an absolute path, got '{path}'")]
    InvalidConfigurationPath { option: &'static str, path: String },

    /// A numeric option could not be parsed.
    #[error("configuration option {option} must be a positive number, got '{value}'")]
    InvalidConfigurationValue { option: &'static str, value: String },

    #[error("command prefix must not be empty")]
    InvalidPrefix,

    /// A stored document id could not be split back into its key fields.
    #[error("malformed stored identity '{0}'")]
    MalformedIdentity(String),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Failure reported by a caller-supplied repository.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether this error is a programming/configuration defect that must
    /// halt startup rather than be reported back to a command invocation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedCooldownScope(_)
                | Self::CooldownUserRequired { .. }
                | Self::InvalidCooldownDuration(_)
                | Self::RepositoryNotConfigured(_)
                | Self::InvalidConfigurationPath { .. }
                | Self::InvalidConfigurationValue { .. }
                | Self::InvalidPrefix
        )
    }

    /// Wrap an arbitrary backend failure.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
