//! Persistence strategy selection.
//!
//! The strategy is chosen once when the orchestrator is built: either the
//! built-in MongoDB store or a caller-supplied set of repositories and
//! probes. It is never re-selected afterwards.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::mongo::{Database, MongoOptions};
use super::repository::{
    CooldownRepository, GuildSettingsRepository, MongoCooldownRepository,
    MongoGuildSettingsRepository,
};
use crate::error::{Error, Result};

/// Readiness of the persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    Connecting,
    Disconnecting,
    Unknown,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Disconnecting => "disconnecting",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Connectivity and connection-state probes for a backend.
pub trait ConnectionProbe: Send + Sync {
    fn is_connected(&self) -> bool;
    fn connection_status(&self) -> ConnectionStatus;
}

/// Probe whose state is set by its owner.
#[derive(Debug)]
pub struct ManualProbe {
    status: RwLock<ConnectionStatus>,
}

impl ManualProbe {
    pub fn new(status: ConnectionStatus) -> Self {
        Self {
            status: RwLock::new(status),
        }
    }

    pub fn connected() -> Self {
        Self::new(ConnectionStatus::Connected)
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.status.write() = status;
    }
}

impl ConnectionProbe for ManualProbe {
    fn is_connected(&self) -> bool {
        *self.status.read() == ConnectionStatus::Connected
    }

    fn connection_status(&self) -> ConnectionStatus {
        *self.status.read()
    }
}

/// Repositories and probes injected by the caller.
#[derive(Clone)]
pub struct CustomPersistence {
    pub probe: Arc<dyn ConnectionProbe>,
    pub guild_settings: Arc<dyn GuildSettingsRepository>,
    pub cooldowns: Arc<dyn CooldownRepository>,
}

impl CustomPersistence {
    pub fn new(
        probe: Arc<dyn ConnectionProbe>,
        guild_settings: Arc<dyn GuildSettingsRepository>,
        cooldowns: Arc<dyn CooldownRepository>,
    ) -> Self {
        Self {
            probe,
            guild_settings,
            cooldowns,
        }
    }
}

impl fmt::Debug for CustomPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPersistence")
            .field("status", &self.probe.connection_status())
            .finish_non_exhaustive()
    }
}

/// How the orchestrator should persist state.
#[derive(Debug, Clone)]
pub enum PersistenceConfig {
    /// Built-in MongoDB store.
    Mongo {
        uri: String,
        database: String,
        options: MongoOptions,
    },
    /// Caller-supplied store.
    Custom(CustomPersistence),
}

/// The selected strategy, resolved from a [`PersistenceConfig`].
pub enum PersistenceStrategy {
    Mongo {
        database: Database,
        guild_settings: Arc<MongoGuildSettingsRepository>,
        cooldowns: Arc<MongoCooldownRepository>,
    },
    Custom(CustomPersistence),
}

impl PersistenceStrategy {
    /// Resolve the configuration, connecting when it is the built-in store.
    pub async fn select(config: PersistenceConfig) -> Result<Self> {
        match config {
            PersistenceConfig::Mongo {
                uri,
                database,
                options,
            } => {
                info!("Connecting to MongoDB...");
                let database = Database::connect(&uri, &database, &options).await?;
                Ok(Self::Mongo {
                    guild_settings: Arc::new(MongoGuildSettingsRepository::new(&database)),
                    cooldowns: Arc::new(MongoCooldownRepository::new(&database)),
                    database,
                })
            }
            PersistenceConfig::Custom(custom) => {
                info!(
                    "Using caller-supplied persistence (status: {})",
                    custom.probe.connection_status()
                );
                Ok(Self::Custom(custom))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mongo { .. } => "mongodb",
            Self::Custom(_) => "custom",
        }
    }

    fn probe(&self) -> &dyn ConnectionProbe {
        match self {
            Self::Mongo { database, .. } => database as &dyn ConnectionProbe,
            Self::Custom(custom) => custom.probe.as_ref(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.probe().is_connected()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.probe().connection_status()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::DatabaseNotConnected)
        }
    }

    /// Guild settings repository, gated on connectivity.
    pub fn guild_settings(&self) -> Result<Arc<dyn GuildSettingsRepository>> {
        self.ensure_connected()?;
        Ok(match self {
            Self::Mongo { guild_settings, .. } => {
                guild_settings.clone() as Arc<dyn GuildSettingsRepository>
            }
            Self::Custom(custom) => custom.guild_settings.clone(),
        })
    }

    /// Cooldown repository, gated on connectivity.
    pub fn cooldowns(&self) -> Result<Arc<dyn CooldownRepository>> {
        self.ensure_connected()?;
        Ok(match self {
            Self::Mongo { cooldowns, .. } => cooldowns.clone() as Arc<dyn CooldownRepository>,
            Self::Custom(custom) => custom.cooldowns.clone(),
        })
    }

    /// Close the built-in connection. Caller-supplied stores manage their own lifecycle.
    pub async fn shutdown(&self) {
        if let Self::Mongo { database, .. } = self {
            database.shutdown().await;
        }
    }
}

impl fmt::Debug for PersistenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceStrategy")
            .field("name", &self.name())
            .field("status", &self.connection_status())
            .finish()
    }
}
