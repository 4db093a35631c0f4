#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use discovery::{Discovery, Paths};
use discovery_core::DiscoveryConfig;
use discovery_store::{
    CircleRecord, Dataset, Engagement, Follow, PostRecord, SqliteStore, UserRecord, UserTag,
};
use tempfile::TempDir;

pub fn user(id: i64, username: &str) -> UserRecord {
    UserRecord {
        id,
        username: username.to_string(),
    }
}

pub fn post(id: i64, title: &str, content: &str, tags: &[&str], age_hours: i64) -> PostRecord {
    PostRecord {
        id,
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author_id: 1,
        circle_id: None,
        created_at: Utc::now() - Duration::hours(age_hours),
        views: 0,
        likes: 0,
        deleted: false,
        hidden: false,
    }
}

pub fn engagement(user_id: i64, post_id: i64, at: DateTime<Utc>) -> Engagement {
    Engagement {
        user_id,
        post_id,
        at,
    }
}

pub fn interests(user_id: i64, tags: &[&str]) -> Vec<UserTag> {
    tags.iter()
        .map(|tag| UserTag {
            user_id,
            tag: tag.to_string(),
        })
        .collect()
}

/// A small community: pets and frontend posts, four users, one circle
pub fn sample_dataset() -> Dataset {
    let mut hidden = post(6, "dog grooming secrets", "dog dog dog", &["pets"], 1);
    hidden.hidden = true;
    let mut in_circle = post(5, "Vue 3 migration notes", "moving from vue 2 to vue 3", &["vue"], 3);
    in_circle.circle_id = Some(10);

    let mut user_tags = interests(1, &["tech"]);
    user_tags.extend(interests(2, &["tech", "art"]));
    user_tags.extend(interests(3, &["tech"]));
    user_tags.extend(interests(4, &["music"]));

    Dataset {
        users: vec![
            user(1, "requester"),
            user(2, "alice"),
            user(3, "bob"),
            user(4, "vuefan"),
        ],
        circles: vec![CircleRecord {
            id: 10,
            name: "Vue Study Group".to_string(),
        }],
        posts: vec![
            post(1, "cats and dogs", "living with pets", &["pets"], 48),
            post(2, "dog training", "a short guide", &["pets", "training"], 24),
            post(3, "React hooks", "hooks in react and vue", &["react", "frontend"], 12),
            post(4, "first vue component", "my first vue component", &["vue", "frontend"], 6),
            in_circle,
            hidden,
        ],
        user_tags,
        follows: vec![Follow {
            follower_id: 1,
            followee_id: 3,
        }],
        engagements: Vec::new(),
    }
}

/// Seeded SQLite engine in a temp data directory
pub fn sqlite_engine(dataset: &Dataset) -> (TempDir, Discovery) {
    sqlite_engine_with(dataset, DiscoveryConfig::default())
}

pub fn sqlite_engine_with(dataset: &Dataset, config: DiscoveryConfig) -> (TempDir, Discovery) {
    let temp = TempDir::new().unwrap();
    let paths = Paths::at(temp.path());
    SqliteStore::new(paths.db_path())
        .unwrap()
        .import(dataset)
        .unwrap();
    let engine = Discovery::open(&paths, config).unwrap();
    (temp, engine)
}
