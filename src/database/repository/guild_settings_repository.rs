//! Guild settings repository backed by MongoDB.
//!
//! One document per guild, `_id` is the guild id.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndReplaceOptions, ReturnDocument};
use tracing::debug;

use super::GuildSettingsRepository;
use crate::database::Database;
use crate::database::models::GuildSettings;
use crate::error::Result;

/// MongoDB repository for guild settings.
#[derive(Debug, Clone)]
pub struct MongoGuildSettingsRepository {
    collection: Collection<GuildSettings>,
}

impl MongoGuildSettingsRepository {
    pub const COLLECTION: &'static str = "guild_settings";

    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(Self::COLLECTION),
        }
    }
}

#[async_trait]
impl GuildSettingsRepository for MongoGuildSettingsRepository {
    async fn find_one(&self, guild_id: &str) -> Result<Option<GuildSettings>> {
        let result = self.collection.find_one(doc! { "_id": guild_id }).await?;
        debug!("DB get guild settings for {}: {:?}", guild_id, result.is_some());
        Ok(result)
    }

    async fn find_all(&self) -> Result<Vec<GuildSettings>> {
        let cursor = self.collection.find(doc! {}).await?;
        let all: Vec<GuildSettings> = cursor.try_collect().await?;
        debug!("DB loaded {} guild settings documents", all.len());
        Ok(all)
    }

    async fn save(&self, settings: &GuildSettings) -> Result<GuildSettings> {
        let filter = doc! { "_id": settings.guild_id() };
        let options = FindOneAndReplaceOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let persisted = self
            .collection
            .find_one_and_replace(filter, settings)
            .with_options(options)
            .await?;

        debug!("Saved guild settings for {}", settings.guild_id());
        Ok(persisted.unwrap_or_else(|| settings.clone()))
    }

    async fn delete(&self, guild_id: &str) -> Result<()> {
        let result = self.collection.delete_one(doc! { "_id": guild_id }).await?;
        debug!(
            "Deleted guild settings for {}: {}",
            guild_id,
            result.deleted_count > 0
        );
        Ok(())
    }
}
