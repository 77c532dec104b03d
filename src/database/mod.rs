//! Database module exports.

pub mod models;
mod mongo;
pub mod repository;
pub mod strategy;

pub use models::*;
pub use mongo::{Database, MongoOptions};
pub use repository::{CooldownRepository, GuildSettingsRepository};
pub use strategy::{
    ConnectionProbe, ConnectionStatus, CustomPersistence, ManualProbe, PersistenceConfig,
    PersistenceStrategy,
};
