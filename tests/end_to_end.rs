use scriptorium::models::{Article, OrganizationType, Payload, Question, ResourceContent, ResourceType};
use scriptorium::{CacheConfig, Config, ContentKey, Context, ManagerConfig, ResourceManager};
use scriptorium_manager::mock::MockAdapter;
use std::sync::Arc;
use time::{Duration, UtcDateTime};

fn config(cache: CacheConfig) -> Config {
    Config {
        resources: ManagerConfig { retry_base_delay_ms: 0, max_retry_attempts: 2, ..ManagerConfig::default() },
        cache,
    }
}

fn in_memory() -> Config {
    config(CacheConfig { path: None, in_memory: true })
}

fn questions(text: &str) -> Payload {
    Payload::Questions(vec![Question {
        id: "q1".to_string(),
        reference: "1:1".to_string(),
        question: text.to_string(),
        response: "God.".to_string(),
    }])
}

async fn open(config: &Config, adapter: &Arc<MockAdapter>) -> ResourceManager {
    scriptorium::open(config, vec![adapter.clone()]).await.unwrap()
}

#[tokio::test]
async fn test_fetch_once_then_serve_from_cache() {
    let adapter = Arc::new(MockAdapter::new(ResourceType::Questions, "tq").with_content("gen", questions("Who?")));
    let manager = open(&in_memory(), &adapter).await;
    let ctx = Context::online();

    let first = manager.get_or_fetch_content(&ctx, "srv/own/en/tq/gen", ResourceType::Questions).await.unwrap();
    let second = manager.get_or_fetch_content(&ctx, "srv/own/en/tq/gen", ResourceType::Questions).await.unwrap();
    assert_eq!(first, Some(questions("Who?")));
    assert_eq!(second, first);
    assert_eq!(adapter.content_calls(), 1);

    let info = manager.get_storage_info().await.unwrap();
    assert_eq!(info.item_count, 1);
    assert!(info.total_size > 0);
}

#[tokio::test]
async fn test_expired_row_is_refreshed() {
    let adapter = Arc::new(MockAdapter::new(ResourceType::Questions, "tq").with_content("gen", questions("New?")));
    let manager = open(&in_memory(), &adapter).await;
    let key = ContentKey::parse("srv/own/en/tq/gen").unwrap();
    let now = UtcDateTime::now();
    let stale = ResourceContent::new(
        key.clone(),
        ResourceType::Questions,
        OrganizationType::Book,
        questions("Old?"),
        now - Duration::days(2),
    )
    .unwrap()
    .with_expiry(Some(now - Duration::hours(1)));
    manager.storage().save_resource_content(&stale).await.unwrap();

    let payload = manager.get_or_fetch_content(&Context::online(), &key.to_string(), ResourceType::Questions).await;
    assert_eq!(payload.unwrap(), Some(questions("New?")));
    let row = manager.storage().get_resource_content(&key).await.unwrap().unwrap();
    assert_eq!(row.content, questions("New?"));
    assert!(row.cached_until.is_some_and(|until| until > now));
}

#[tokio::test]
async fn test_failed_refresh_serves_stale_row() {
    let adapter = Arc::new(MockAdapter::new(ResourceType::Questions, "tq"));
    adapter.set_failing(true);
    let manager = open(&in_memory(), &adapter).await;
    let key = ContentKey::parse("srv/own/en/tq/gen").unwrap();
    let now = UtcDateTime::now();
    let stale =
        ResourceContent::new(key.clone(), ResourceType::Questions, OrganizationType::Book, questions("Old?"), now)
            .unwrap()
            .with_expiry(Some(now - Duration::hours(1)));
    manager.storage().save_resource_content(&stale).await.unwrap();

    let payload = manager.get_or_fetch_content(&Context::online(), &key.to_string(), ResourceType::Questions).await;
    assert_eq!(payload.unwrap(), Some(questions("Old?")));
    assert_eq!(adapter.content_calls(), 2, "every retry attempt reaches the adapter");
    let row = manager.storage().get_resource_content(&key).await.unwrap().unwrap();
    assert!(row.cached_until.is_some_and(|until| until > now), "stale row is re-stamped");
}

#[tokio::test]
async fn test_offline_never_touches_the_remote() {
    let adapter = Arc::new(MockAdapter::new(ResourceType::Questions, "tq").with_content("gen", questions("Who?")));
    let manager = open(&in_memory(), &adapter).await;
    let ctx = Context::offline();

    let payload = manager.get_or_fetch_content(&ctx, "srv/own/en/tq/gen", ResourceType::Questions).await.unwrap();
    assert_eq!(payload, None);
    assert!(manager.get_resource_metadata(&ctx, "srv", "own", "en").await.unwrap().is_empty());
    let summary = manager.preload_content(&ctx, &["srv/own/en/tq/gen"], ResourceType::Questions).await;
    assert_eq!(summary.missing, 1);
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn test_preload_then_read_offline() {
    let adapter = Arc::new(
        MockAdapter::new(ResourceType::Methodology, "methodology-articles")
            .with_content("translate/figs-metaphor", Payload::Article(Article {
                title: "Metaphor".to_string(),
                body: "# Metaphor".to_string(),
            }))
            .with_content("translate/figs-simile", Payload::Article(Article {
                title: "Simile".to_string(),
                body: "# Simile".to_string(),
            })),
    );
    let manager = open(&in_memory(), &adapter).await;
    let keys = [
        "srv/own/en/methodology-articles/translate/figs-metaphor",
        "srv/own/en/methodology-articles/translate/figs-simile",
        "srv/own/en/methodology-articles/translate/figs-missing",
    ];

    let summary = manager.preload_content(&Context::online(), &keys, ResourceType::Methodology).await;
    assert_eq!(summary.requested, 3);
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.failed, 1);

    let calls = adapter.calls();
    let cached = manager
        .get_or_fetch_content(&Context::offline(), keys[1], ResourceType::Methodology)
        .await
        .unwrap();
    assert!(matches!(cached, Some(Payload::Article(article)) if article.title == "Simile"));
    assert_eq!(adapter.calls(), calls);
}

#[tokio::test]
async fn test_metadata_is_fetched_and_cached() {
    let adapter = Arc::new(MockAdapter::new(ResourceType::Scripture, "ult").with_anchor(true).with_commit("abc123"));
    let manager = open(&in_memory(), &adapter).await;

    let rows = manager.get_resource_metadata(&Context::online(), "srv", "own", "en").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "ult");
    assert!(rows[0].is_anchor);

    let offline = manager.get_resource_metadata(&Context::offline(), "srv", "own", "en").await.unwrap();
    assert_eq!(offline.len(), 1);
    assert_eq!(offline[0].commit_sha.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(CacheConfig { path: Some(dir.path().join("nested/cache.sqlite")), in_memory: false });
    let adapter = Arc::new(MockAdapter::new(ResourceType::Questions, "tq").with_content("gen", questions("Who?")));

    let manager = open(&config, &adapter).await;
    manager.get_or_fetch_content(&Context::online(), "srv/own/en/tq/gen", ResourceType::Questions).await.unwrap();
    drop(manager);

    let reopened = open(&config, &adapter).await;
    let payload =
        reopened.get_or_fetch_content(&Context::offline(), "srv/own/en/tq/gen", ResourceType::Questions).await;
    assert_eq!(payload.unwrap(), Some(questions("Who?")));
    assert_eq!(reopened.clear_all_content().await.unwrap(), 1);
    assert_eq!(reopened.get_storage_info().await.unwrap().item_count, 0);
}

#[tokio::test]
async fn test_open_rejects_invalid_config() {
    let adapter = Arc::new(MockAdapter::new(ResourceType::Questions, "tq"));
    let mut config = in_memory();
    config.resources.timeout_ms = 0;
    let err = scriptorium::open(&config, vec![adapter]).await.err().unwrap();
    assert_eq!(*err, scriptorium::error::ErrorKind::Config);
}
