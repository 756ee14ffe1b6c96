use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use linkhop_core::{LinkId, NewLink, Slug, Ttl, Visit};
use linkhop_storage::{LinkStore, MySqlLinkStore, StorageError};
use linkhop_test_infra::mysql::{MySqlServer, MysqlConfig};

const DEADLINE: Duration = Duration::from_secs(5);

struct Fixture {
    _mysql: MySqlServer,
    store: MySqlLinkStore,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let store = connect_with_retry(&url).await;
        store.migrate().await.expect("apply migrations");

        Self {
            _mysql: mysql,
            store,
        }
    }
}

async fn connect_with_retry(url: &str) -> MySqlLinkStore {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlLinkStore::connect(url, 16).await {
            Ok(store) => return store,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn new_link(slug: &str, url: &str, ttl: Option<u64>) -> NewLink {
    NewLink {
        slug: Slug::new_unchecked(slug),
        url: url.to_string(),
        ttl: ttl.map(|secs| Ttl::from_secs(secs).unwrap()),
    }
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn create_and_get_link() {
    let fixture = Fixture::start().await;

    let created = fixture
        .store
        .create_link(new_link("abc123", "https://example.com", Some(5)))
        .await
        .unwrap();

    let got = fixture
        .store
        .get_by_slug(&created.slug)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.id, created.id);
    assert_eq!(got.url, "https://example.com");
    assert_eq!(got.ttl.map(|t| t.as_secs()), Some(5));
    assert_eq!(got.clicks, 0);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn create_conflicts_when_slug_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .create_link(new_link("dup", "https://x", None))
        .await
        .unwrap();

    let err = fixture
        .store
        .create_link(new_link("dup", "https://y", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));

    let kept = fixture
        .store
        .get_by_slug(&Slug::new_unchecked("dup"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.url, "https://x");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn slugs_are_case_sensitive() {
    let fixture = Fixture::start().await;

    fixture
        .store
        .create_link(new_link("Case", "https://upper", None))
        .await
        .unwrap();
    fixture
        .store
        .create_link(new_link("case", "https://lower", None))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn concurrent_clicks_all_land() {
    let fixture = Fixture::start().await;
    let store = Arc::new(fixture.store.clone());
    let link = store
        .create_link(new_link("hot", "https://example.com", None))
        .await
        .unwrap();

    let mut handles = vec![];
    for i in 0..40 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let visit = Visit {
                ip: Some(format!("198.51.100.{i}")),
                user_agent: Some("integration".to_string()),
                referer: None,
            };
            store.record_click(link.id, visit, DEADLINE).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let got = store.get_by_slug(&link.slug).await.unwrap().unwrap();
    assert_eq!(got.clicks, 40);

    let since = Timestamp::now() - SignedDuration::from_hours(24);
    assert_eq!(store.count_clicks_since(link.id, since).await.unwrap(), 40);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn record_click_for_unknown_link_rolls_back() {
    let fixture = Fixture::start().await;

    let err = fixture
        .store
        .record_click(LinkId(4242), Visit::default(), DEADLINE)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Missing(_)));

    let since = Timestamp::now() - SignedDuration::from_hours(24);
    assert_eq!(
        fixture
            .store
            .count_clicks_since(LinkId(4242), since)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn count_excludes_clicks_before_window() {
    let fixture = Fixture::start().await;
    let link = fixture
        .store
        .create_link(new_link("windowed", "https://example.com", None))
        .await
        .unwrap();

    fixture
        .store
        .record_click(link.id, Visit::default(), DEADLINE)
        .await
        .unwrap();

    let future = Timestamp::now() + SignedDuration::from_mins(1);
    assert_eq!(
        fixture
            .store
            .count_clicks_since(link.id, future)
            .await
            .unwrap(),
        0
    );
}
