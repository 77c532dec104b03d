//! In-memory repositories.
//!
//! Usable as a caller-supplied backend when no document store is wanted,
//! and as the store behind the orchestrator tests. They follow the same
//! identity and upsert rules as the MongoDB repositories.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::cooldown_repository::CooldownDocument;
use super::{CooldownRepository, GuildSettingsRepository};
use crate::database::models::{Cooldown, CooldownQuery, GuildSettings};
use crate::error::{Error, Result};

/// Guild settings kept in a map keyed by guild id.
#[derive(Debug, Default)]
pub struct MemoryGuildSettingsRepository {
    documents: DashMap<String, GuildSettings>,
}

impl MemoryGuildSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing documents.
    pub fn with_documents(documents: impl IntoIterator<Item = GuildSettings>) -> Self {
        let repo = Self::new();
        for settings in documents {
            repo.documents.insert(settings.guild_id().to_string(), settings);
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl GuildSettingsRepository for MemoryGuildSettingsRepository {
    async fn find_one(&self, guild_id: &str) -> Result<Option<GuildSettings>> {
        Ok(self.documents.get(guild_id).map(|doc| doc.clone()))
    }

    async fn find_all(&self) -> Result<Vec<GuildSettings>> {
        Ok(self.documents.iter().map(|doc| doc.value().clone()).collect())
    }

    async fn save(&self, settings: &GuildSettings) -> Result<GuildSettings> {
        self.documents
            .insert(settings.guild_id().to_string(), settings.clone());
        Ok(settings.clone())
    }

    async fn delete(&self, guild_id: &str) -> Result<()> {
        self.documents.remove(guild_id);
        Ok(())
    }
}

/// Cooldowns kept as documents keyed by derived identity.
#[derive(Debug, Default)]
pub struct MemoryCooldownRepository {
    documents: DashMap<String, CooldownDocument>,
}

impl MemoryCooldownRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document by identity.
    pub fn document(&self, id: &str) -> Option<CooldownDocument> {
        self.documents.get(id).map(|doc| doc.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl CooldownRepository for MemoryCooldownRepository {
    async fn find_one(&self, query: &CooldownQuery) -> Result<Option<Cooldown>> {
        self.documents
            .get(&query.identity())
            .filter(|doc| doc.name == query.command_id)
            .map(|doc| doc.clone().into_cooldown())
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Cooldown>> {
        let documents: Vec<CooldownDocument> =
            self.documents.iter().map(|doc| doc.value().clone()).collect();
        documents
            .into_iter()
            .map(CooldownDocument::into_cooldown)
            .collect()
    }

    async fn save(&self, cooldown: &Cooldown) -> Result<Cooldown> {
        let document = CooldownDocument::from_cooldown(cooldown)?;

        match self.documents.entry(document.id.clone()) {
            Entry::Occupied(mut existing) => {
                // Same id under different discriminators is a key collision, as
                // the filtered upsert would hit a duplicate `_id`.
                let stored = existing.get();
                if stored.name != document.name || stored.kind != document.kind {
                    return Err(Error::backend(format!(
                        "duplicate cooldown identity '{}'",
                        document.id
                    )));
                }
                existing.insert(document.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
            }
        }

        document.into_cooldown()
    }

    async fn delete(&self, query: &CooldownQuery) -> Result<()> {
        self.documents
            .remove_if(&query.identity(), |_, doc| doc.name == query.command_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Prefix;

    #[tokio::test]
    async fn guild_settings_upsert_and_delete() {
        let repo = MemoryGuildSettingsRepository::new();
        let mut settings = GuildSettings::new("g1", Prefix::new("!").unwrap());

        repo.save(&settings).await.unwrap();
        settings.set_prefix(Prefix::new("?").unwrap());
        repo.save(&settings).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find_one("g1").await.unwrap(), Some(settings));

        repo.delete("g1").await.unwrap();
        repo.delete("g1").await.unwrap();
        assert!(repo.find_one("g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cooldown_save_is_idempotent() {
        let repo = MemoryCooldownRepository::new();
        let cooldown = Cooldown::per_user("ban", "g1", "u1", 600);

        let first = repo.save(&cooldown).await.unwrap();
        let snapshot = repo.document("ban-g1-u1");
        let second = repo.save(&cooldown).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.document("ban-g1-u1"), snapshot);
    }

    #[tokio::test]
    async fn delete_by_query_removes_global_document() {
        let repo = MemoryCooldownRepository::new();
        repo.save(&Cooldown::global("ban", "g1", 600)).await.unwrap();
        repo.save(&Cooldown::per_user("ban", "g1", "u1", 600)).await.unwrap();

        repo.delete(&CooldownQuery::global("ban", "g1")).await.unwrap();
        assert!(repo.document("ban-g1").is_none());
        assert!(repo.document("ban-g1-u1").is_some());

        // missing key is a no-op
        repo.delete(&CooldownQuery::global("ban", "g1")).await.unwrap();
    }

    #[tokio::test]
    async fn find_one_infers_scope_from_user() {
        let repo = MemoryCooldownRepository::new();
        repo.save(&Cooldown::per_user("ban", "g1", "u1", 90)).await.unwrap();

        let found = repo
            .find_one(&CooldownQuery::per_user("ban", "g1", "u1"))
            .await
            .unwrap();
        assert_eq!(found, Some(Cooldown::per_user("ban", "g1", "u1", 90)));
        assert!(repo
            .find_one(&CooldownQuery::global("ban", "g1"))
            .await
            .unwrap()
            .is_none());
    }
}
