mod common;

use common::{post, sample_dataset, sqlite_engine};
use discovery::{Discovery, Paths};
use discovery_core::{DiscoveryConfig, SuggestionEntry, SuggestionKind};
use discovery_store::{Dataset, SqliteStore, UserRecord};
use serial_test::serial;
use tempfile::TempDir;

#[tokio::test]
async fn test_title_weighting_ranks_exact_title_match_first() {
    let (_temp, engine) = sqlite_engine(&sample_dataset());

    let results = engine.search("dog", None).await.unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r.document.id).collect();

    // Post 6 matches too but is hidden
    assert_eq!(ids, vec![2, 1]);
    assert!(results[0].score > results[1].score);
    assert_eq!(results[0].document.tags, vec!["pets", "training"]);
}

#[tokio::test]
async fn test_blank_query_lists_recent_live_posts() {
    let (_temp, engine) = sqlite_engine(&sample_dataset());

    let results = engine.search("   ", Some(3)).await.unwrap();
    let ids: Vec<i64> = results.iter().map(|r| r.document.id).collect();
    assert_eq!(ids, vec![5, 4, 3]);
    assert!(results.iter().all(|r| r.score == 0.0));
}

#[tokio::test]
async fn test_circle_name_is_resolved() {
    let (_temp, engine) = sqlite_engine(&sample_dataset());

    let results = engine.search("migration", Some(1)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].document.circle_name.as_deref(),
        Some("Vue Study Group")
    );
}

#[tokio::test]
async fn test_searches_feed_hot_suggestions() {
    let (_temp, engine) = sqlite_engine(&sample_dataset());

    engine.search("vue", None).await.unwrap();
    engine.search("vue", Some(1)).await.unwrap();
    engine.search("react", None).await.unwrap();
    engine.search("haskell", None).await.unwrap();
    engine.flush().await;

    let hot = engine.suggest("", 5).await.unwrap();
    assert_eq!(
        hot,
        vec![
            SuggestionEntry::new("vue", SuggestionKind::Hot),
            SuggestionEntry::new("react", SuggestionKind::Hot),
        ]
    );
}

fn multilingual_dataset() -> Dataset {
    Dataset {
        users: vec![UserRecord {
            id: 1,
            username: "Jürgen".to_string(),
        }],
        posts: vec![
            post(1, "学习Rust编程", "今天学习异步", &["编程"], 4),
            post(2, "Ärger im Büro", "Über Kollegen und Chefs", &["Arbeit"], 3),
            post(3, "Привет мир", "первый пост", &["Язык"], 2),
            post(4, "garden notes", "tomatoes again", &["garden"], 1),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_cjk_query_searches_and_suggests() {
    let (_temp, engine) = sqlite_engine(&multilingual_dataset());

    let entries = engine.suggest("编程", 10).await.unwrap();
    assert_eq!(
        entries,
        vec![
            SuggestionEntry::new("学习Rust编程", SuggestionKind::Title),
            SuggestionEntry::new("编程", SuggestionKind::Tag),
        ]
    );

    let results = engine.search("编程", None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, 1);
    assert!(results[0].score > 0.0);
}

#[tokio::test]
async fn test_cased_non_ascii_query_searches_and_suggests() {
    let (_temp, engine) = sqlite_engine(&multilingual_dataset());

    // Suggest before searching so recorded keywords stay out of the hot source
    let entries = engine.suggest("ÄRGER", 10).await.unwrap();
    assert_eq!(
        entries,
        vec![SuggestionEntry::new("Ärger im Büro", SuggestionKind::Title)]
    );

    let entries = engine.suggest("jür", 10).await.unwrap();
    assert_eq!(
        entries,
        vec![SuggestionEntry::new("Jürgen", SuggestionKind::User)]
    );

    for query in ["Ärger", "ärger", "BÜRO"] {
        let results = engine.search(query, None).await.unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.document.id).collect();
        assert_eq!(ids, vec![2], "{query}");
        assert!(results[0].score > 0.0);
    }
    let results = engine.search("ПРИВЕТ", None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, 3);
}

#[tokio::test]
async fn test_seed_from_json_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("dataset.json");
    let dataset = Dataset {
        posts: vec![post(1, "rust ownership", "borrowing explained", &["rust"], 1)],
        ..Default::default()
    };
    std::fs::write(&file, serde_json::to_string(&dataset).unwrap()).unwrap();

    let paths = Paths::at(temp.path().join("home"));
    let loaded = Dataset::from_json_file(&file).unwrap();
    let store = SqliteStore::new(paths.db_path()).unwrap();
    assert_eq!(store.import(&loaded).unwrap(), 1);

    let engine = Discovery::open(&paths, DiscoveryConfig::default()).unwrap();
    let results = engine.search("ownership", None).await.unwrap();
    assert_eq!(results.len(), 1);
    // No user record for the author
    assert_eq!(results[0].document.author_name, "");
}

#[tokio::test]
#[serial]
async fn test_engine_opens_under_discovery_home() {
    let temp = TempDir::new().unwrap();
    unsafe { std::env::set_var(discovery::paths::HOME_ENV, temp.path()) };
    let paths = Paths::new().unwrap();
    unsafe { std::env::remove_var(discovery::paths::HOME_ENV) };

    let config = paths.load_config(None).unwrap();
    let engine = Discovery::open(&paths, config).unwrap();
    assert!(engine.search("anything", None).await.unwrap().is_empty());
    assert!(temp.path().join("discovery.db").exists());
}
