mod common;

use common::{harness, settings};
use guildkit::{ConnectionStatus, Error, GuildKit, GuildSettingsRepository};

#[tokio::test]
async fn new_guild_gets_default_prefix_then_persists_change() {
    let h = harness("!", vec![]).await;

    let created = h.kit.get_or_create_guild_settings("g2").await.unwrap();
    assert_eq!(created.prefix().as_str(), "!");
    assert_eq!(h.settings.calls.find_one(), 1);
    // created in memory only, nothing stored yet
    assert_eq!(h.settings.calls.save(), 0);
    assert!(h.settings.inner.is_empty());

    let updated = h.kit.set_prefix(Some("g2"), "?").await.unwrap().unwrap();
    assert_eq!(updated.prefix().as_str(), "?");
    assert_eq!(h.settings.calls.save(), 1);

    let stored = h.settings.inner.find_one("g2").await.unwrap().unwrap();
    assert_eq!(stored.prefix().as_str(), "?");

    let cached = h.kit.get_or_create_guild_settings("g2").await.unwrap();
    assert_eq!(cached.prefix().as_str(), "?");
    assert_eq!(h.settings.calls.find_one(), 1, "no further read after the first");
}

#[tokio::test]
async fn cache_hit_skips_storage() {
    let h = harness("!", vec![]).await;

    for _ in 0..5 {
        h.kit.get_or_create_guild_settings("g1").await.unwrap();
    }
    assert_eq!(h.settings.calls.find_one(), 1);
}

#[tokio::test]
async fn startup_warms_every_stored_guild() {
    let h = harness("!", vec![settings("g1", "$"), settings("g3", "%")]).await;
    assert_eq!(h.settings.calls.find_all(), 1);

    let g1 = h.kit.get_or_create_guild_settings("g1").await.unwrap();
    let g3 = h.kit.get_or_create_guild_settings("g3").await.unwrap();

    assert_eq!(g1.prefix().as_str(), "$");
    assert_eq!(g3.prefix().as_str(), "%");
    assert_eq!(h.settings.calls.find_one(), 0);
}

#[tokio::test]
async fn set_prefix_without_guild_is_a_no_op() {
    let h = harness("!", vec![]).await;

    assert!(h.kit.set_prefix(None, "?").await.unwrap().is_none());
    assert_eq!(h.settings.calls.total(), 1, "only the startup warm");
}

#[tokio::test]
async fn empty_prefix_is_rejected_before_io() {
    let h = harness("!", vec![]).await;

    assert!(matches!(
        h.kit.set_prefix(Some("g1"), "").await,
        Err(Error::InvalidPrefix)
    ));
    assert_eq!(h.settings.calls.find_one(), 0);
    assert_eq!(h.settings.calls.save(), 0);
}

#[tokio::test]
async fn concurrent_misses_for_one_guild_read_once() {
    let h = harness("!", vec![settings("g1", "$")]).await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let kit = h.kit.clone();
            tokio::spawn(async move { kit.get_or_create_guild_settings("g9").await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap().prefix().as_str(), "!");
    }
    assert_eq!(h.settings.calls.find_one(), 1);
}

#[tokio::test]
async fn concurrent_prefix_changes_are_serialized() {
    let h = harness("!", vec![]).await;

    let prefixes = ["a", "b", "c", "d", "e", "f"];
    let tasks: Vec<_> = prefixes
        .into_iter()
        .map(|prefix| {
            let kit = h.kit.clone();
            tokio::spawn(async move { kit.set_prefix(Some("g1"), prefix).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(h.settings.calls.save(), prefixes.len());
    assert_eq!(h.settings.calls.find_one(), 1);

    // cache and storage agree on whichever write landed last
    let cached = h.kit.get_or_create_guild_settings("g1").await.unwrap();
    let stored = h.settings.inner.find_one("g1").await.unwrap().unwrap();
    assert_eq!(cached, stored);
}

#[tokio::test]
async fn category_registration_persists() {
    let h = harness("!", vec![settings("g1", "$")]).await;

    let updated = h
        .kit
        .set_category_emoji(Some("g1"), "fun", Some("🎉"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.category_emoji("fun"), Some(Some("🎉")));
    assert_eq!(updated.prefix().as_str(), "$");

    let stored = h.settings.inner.find_one("g1").await.unwrap().unwrap();
    assert_eq!(stored.category_emoji("fun"), Some(Some("🎉")));
}

#[tokio::test]
async fn prefix_for_falls_back_outside_guilds() {
    let h = harness("!", vec![settings("g1", "$")]).await;

    assert_eq!(h.kit.prefix_for(None).await.unwrap().as_str(), "!");
    assert_eq!(h.kit.prefix_for(Some("g1")).await.unwrap().as_str(), "$");
}

#[tokio::test]
async fn disconnected_backend_fails_miss_and_mutation() {
    let h = harness("!", vec![settings("g1", "$")]).await;
    h.probe.set_status(ConnectionStatus::Disconnected);
    let io_before = h.settings.calls.total();

    // cached guilds are still served
    assert_eq!(
        h.kit.get_or_create_guild_settings("g1").await.unwrap().prefix().as_str(),
        "$"
    );
    assert!(matches!(
        h.kit.get_or_create_guild_settings("g2").await,
        Err(Error::DatabaseNotConnected)
    ));
    assert!(matches!(
        h.kit.set_prefix(Some("g1"), "?").await,
        Err(Error::DatabaseNotConnected)
    ));
    assert_eq!(h.settings.calls.total(), io_before);

    // failed mutation left the cache untouched
    assert_eq!(
        h.kit.get_or_create_guild_settings("g1").await.unwrap().prefix().as_str(),
        "$"
    );
}

#[tokio::test]
async fn without_persistence_settings_live_in_memory() {
    let kit = GuildKit::init(&common::config("!"), None).await.unwrap();

    assert!(!kit.is_db_connected());
    assert_eq!(kit.connection_status(), ConnectionStatus::Disconnected);

    kit.set_prefix(Some("g1"), "?").await.unwrap();
    assert_eq!(
        kit.get_or_create_guild_settings("g1").await.unwrap().prefix().as_str(),
        "?"
    );
}
