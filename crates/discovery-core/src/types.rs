//! Core types for ranking, suggestion and recommendation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;

/// A post snapshot as supplied by the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Tag names in assignment order
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: UserId,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub circle_id: Option<i64>,
    #[serde(default)]
    pub circle_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
}

/// A document with its relevance for one query
#[derive(Debug, Clone, Serialize)]
pub struct RankedDocument {
    pub document: Document,
    pub score: f64,
}

/// Origin of a suggestion entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Title,
    Content,
    Tag,
    User,
    Circle,
    Hot,
}

impl SuggestionKind {
    /// Merge order used by the aggregator
    pub const ORDER: [SuggestionKind; 6] = [
        SuggestionKind::Title,
        SuggestionKind::Content,
        SuggestionKind::Tag,
        SuggestionKind::User,
        SuggestionKind::Circle,
        SuggestionKind::Hot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Title => "title",
            SuggestionKind::Content => "content",
            SuggestionKind::Tag => "tag",
            SuggestionKind::User => "user",
            SuggestionKind::Circle => "circle",
            SuggestionKind::Hot => "hot",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionEntry {
    pub keyword: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
}

impl SuggestionEntry {
    pub fn new(keyword: impl Into<String>, kind: SuggestionKind) -> Self {
        Self {
            keyword: keyword.into(),
            kind,
        }
    }
}

/// A member of a ranked popularity counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotKeyword {
    pub member: String,
    pub score: f64,
}

/// Engagement volume attributed to one tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEngagement {
    pub tag: String,
    pub count: u64,
}

impl TagEngagement {
    pub fn new(tag: impl Into<String>, count: u64) -> Self {
        Self {
            tag: tag.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecommendation {
    pub tag: String,
    /// Live (non-deleted, non-hidden) posts carrying the tag
    pub post_count: u64,
    /// Engagement within the window; drives ordering
    pub engagement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecommendation {
    pub user_id: UserId,
    pub username: Option<String>,
    pub similarity: f64,
}
