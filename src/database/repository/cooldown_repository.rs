//! Cooldown repository backed by MongoDB.
//!
//! Documents are `{ _id, name, type, cooldown }` where `_id` is the derived
//! cooldown identity. Writes match on the identity and on the immutable
//! `name`/`type` fields, so two differently scoped records that happen to
//! derive the same id never overwrite each other.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Document, doc};
use mongodb::options::ReplaceOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CooldownRepository;
use crate::database::Database;
use crate::database::models::{Cooldown, CooldownQuery, CooldownScope, parse_identity};
use crate::error::Result;

/// Persisted cooldown layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownDocument {
    #[serde(rename = "_id")]
    pub id: String,

    /// Command id.
    pub name: String,

    /// Scope string, `global` or `per-user`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Seconds remaining.
    pub cooldown: i64,
}

impl CooldownDocument {
    /// Build the document for a cooldown. Fails before any I/O when the
    /// identity cannot be derived.
    pub fn from_cooldown(cooldown: &Cooldown) -> Result<Self> {
        Ok(Self {
            id: cooldown.identity()?,
            name: cooldown.command_id.clone(),
            kind: cooldown.scope.as_str().to_string(),
            cooldown: i64::try_from(cooldown.seconds_remaining).unwrap_or(i64::MAX),
        })
    }

    /// Rebuild the entity, recovering key fields from the stored identity.
    pub fn into_cooldown(self) -> Result<Cooldown> {
        let scope: CooldownScope = self.kind.parse()?;
        let key = parse_identity(&self.id, scope)?;
        Ok(Cooldown::new(
            key.command_id,
            key.guild_id,
            key.user_id,
            scope,
            u64::try_from(self.cooldown).unwrap_or(0),
        ))
    }

    /// Upsert filter: identity plus discriminators.
    pub fn upsert_filter(&self) -> Document {
        doc! { "_id": &self.id, "name": &self.name, "type": &self.kind }
    }
}

/// Filter for lookups and deletes: identity plus command id.
pub fn key_filter(query: &CooldownQuery) -> Document {
    doc! { "_id": query.identity(), "name": &query.command_id }
}

/// MongoDB repository for cooldowns.
#[derive(Debug, Clone)]
pub struct MongoCooldownRepository {
    collection: Collection<CooldownDocument>,
}

impl MongoCooldownRepository {
    pub const COLLECTION: &'static str = "cooldowns";

    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(Self::COLLECTION),
        }
    }
}

#[async_trait]
impl CooldownRepository for MongoCooldownRepository {
    async fn find_one(&self, query: &CooldownQuery) -> Result<Option<Cooldown>> {
        let result = self.collection.find_one(key_filter(query)).await?;
        debug!("DB get cooldown {}: {:?}", query.identity(), result.is_some());
        result.map(CooldownDocument::into_cooldown).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Cooldown>> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<CooldownDocument> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(CooldownDocument::into_cooldown)
            .collect()
    }

    async fn save(&self, cooldown: &Cooldown) -> Result<Cooldown> {
        let document = CooldownDocument::from_cooldown(cooldown)?;
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(document.upsert_filter(), &document)
            .with_options(options)
            .await?;

        debug!("Saved cooldown {} ({}s)", document.id, document.cooldown);
        document.into_cooldown()
    }

    async fn delete(&self, query: &CooldownQuery) -> Result<()> {
        let result = self.collection.delete_one(key_filter(query)).await?;
        debug!(
            "Deleted cooldown {}: {}",
            query.identity(),
            result.deleted_count > 0
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn document_layout() {
        let document = CooldownDocument::from_cooldown(&Cooldown::per_user("ban", "g1", "u1", 600))
            .unwrap();
        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "_id": "ban-g1-u1", "name": "ban", "type": "per-user", "cooldown": 600 })
        );
    }

    #[test]
    fn upsert_filter_matches_identity_and_discriminators() {
        let document =
            CooldownDocument::from_cooldown(&Cooldown::global("ban", "g1", 300)).unwrap();
        let filter = document.upsert_filter();
        assert_eq!(filter.get_str("_id").unwrap(), "ban-g1");
        assert_eq!(filter.get_str("name").unwrap(), "ban");
        assert_eq!(filter.get_str("type").unwrap(), "global");
        assert!(filter.get("cooldown").is_none());
    }

    #[test]
    fn key_filter_uses_inferred_scope() {
        let filter = key_filter(&CooldownQuery::global("ban", "g1"));
        assert_eq!(filter.get_str("_id").unwrap(), "ban-g1");
        assert_eq!(filter.get_str("name").unwrap(), "ban");

        let filter = key_filter(&CooldownQuery::per_user("ban", "g1", "u1"));
        assert_eq!(filter.get_str("_id").unwrap(), "ban-g1-u1");
    }

    #[test]
    fn stored_document_round_trips_into_entity() {
        let document = CooldownDocument {
            id: "ban-g1-u1".into(),
            name: "ban".into(),
            kind: "per-user".into(),
            cooldown: 42,
        };
        assert_eq!(
            document.into_cooldown().unwrap(),
            Cooldown::per_user("ban", "g1", "u1", 42)
        );
    }

    #[test]
    fn unknown_stored_type_is_a_configuration_error() {
        let document = CooldownDocument {
            id: "ban-g1".into(),
            name: "ban".into(),
            kind: "perGuild".into(),
            cooldown: 42,
        };
        assert!(matches!(
            document.into_cooldown(),
            Err(Error::UnrecognizedCooldownScope(_))
        ));
    }

    #[test]
    fn per_user_without_user_fails_before_building_a_document() {
        let cooldown = Cooldown::new("ban", "g1", None, CooldownScope::PerUser, 10);
        assert!(matches!(
            CooldownDocument::from_cooldown(&cooldown),
            Err(Error::CooldownUserRequired { .. })
        ));
    }
}
