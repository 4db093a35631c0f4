//! Collaborator interfaces consumed by the discovery core
//!
//! Every port is read-only except [`PopularityCounter`]. Implementations live
//! outside the ranking logic (see `discovery-store`) and report failures as
//! [`DiscoveryError::Upstream`](crate::DiscoveryError::Upstream).

use crate::error::Result;
use crate::types::{Document, HotKeyword, TagEngagement, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Coarse, unranked filter of documents mentioning the query
    async fn candidates_for_query(&self, query: &str, max_candidates: usize)
        -> Result<Vec<Document>>;

    /// Most recent documents, newest first
    async fn recent_documents(&self, limit: usize) -> Result<Vec<Document>>;

    /// Live (non-deleted, non-hidden) documents carrying the tag
    async fn document_count_for_tag(&self, tag: &str) -> Result<u64>;
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn engagements_by_user(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<TagEngagement>>;

    async fn engagements_global(&self, since: DateTime<Utc>) -> Result<Vec<TagEngagement>>;
}

#[async_trait]
pub trait TagAssignmentStore: Send + Sync {
    /// Full scan of user → assigned tag names
    async fn all_user_tag_profiles(&self) -> Result<HashMap<UserId, Vec<String>>>;
}

#[async_trait]
pub trait FollowGraph: Send + Sync {
    async fn followed_ids(&self, user_id: UserId) -> Result<HashSet<UserId>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Ids without an account are absent from the result
    async fn usernames(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>>;
}

/// Ranked counter keyed by name (a sorted set of member → score)
#[async_trait]
pub trait PopularityCounter: Send + Sync {
    async fn increment(&self, key: &str, member: &str) -> Result<()>;

    /// Highest scores first
    async fn top_k(&self, key: &str, k: usize) -> Result<Vec<HotKeyword>>;

    /// Drop the whole key once `ttl` elapses from now
    async fn expire_after(&self, key: &str, ttl: Duration) -> Result<()>;
}

/// Typed substring lookups feeding the suggestion fan-out
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn titles_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>>;

    /// Excerpts of post bodies around the match
    async fn content_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>>;

    async fn tags_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>>;

    async fn usernames_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>>;

    async fn circles_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>>;
}
