//! JSON dataset used to seed stores

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use discovery_core::{Document, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: UserId,
    #[serde(default)]
    pub circle_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl PostRecord {
    pub fn is_live(&self) -> bool {
        !self.deleted && !self.hidden
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTag {
    pub user_id: UserId,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: UserId,
    pub followee_id: UserId,
}

/// A user touching a post (view, like, comment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub user_id: UserId,
    pub post_id: i64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub users: Vec<UserRecord>,
    pub circles: Vec<CircleRecord>,
    pub posts: Vec<PostRecord>,
    pub user_tags: Vec<UserTag>,
    pub follows: Vec<Follow>,
    pub engagements: Vec<Engagement>,
}

impl Dataset {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing dataset {}", path.display()))
    }

    /// Live posts as documents, with author and circle names resolved
    pub fn documents(&self) -> Vec<Document> {
        let usernames: HashMap<UserId, &str> = self
            .users
            .iter()
            .map(|u| (u.id, u.username.as_str()))
            .collect();
        let circles: HashMap<i64, &str> = self
            .circles
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();

        self.posts
            .iter()
            .filter(|p| p.is_live())
            .map(|p| Document {
                id: p.id,
                title: p.title.clone(),
                content: p.content.clone(),
                tags: p.tags.clone(),
                author_id: p.author_id,
                author_name: usernames
                    .get(&p.author_id)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                circle_id: p.circle_id,
                circle_name: p
                    .circle_id
                    .and_then(|id| circles.get(&id))
                    .map(|s| s.to_string()),
                created_at: p.created_at,
                views: p.views,
                likes: p.likes,
            })
            .collect()
    }
}
