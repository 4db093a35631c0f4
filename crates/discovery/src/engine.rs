//! The `Discovery` facade: one value wiring every service to its collaborators

use crate::paths::Paths;
use discovery_core::{
    DiscoveryConfig, DocumentStore, EngagementStore, FollowGraph, PendingWrites,
    PopularityCounter, RankedDocument, Result, SuggestionEntry, SuggestionSource,
    TagAssignmentStore, TopicRecommendation, UserDirectory, UserId, UserRecommendation,
};
use discovery_index::SearchService;
use discovery_recommend::{FullScanProfiles, ProfileSource, TopicRecommender, UserRecommender};
use discovery_store::{SqlitePopularityCounter, SqliteStore};
use discovery_suggest::SuggestionAggregator;
use std::sync::Arc;

/// A backing store that serves every read port
pub trait DiscoveryStore:
    DocumentStore
    + EngagementStore
    + TagAssignmentStore
    + FollowGraph
    + UserDirectory
    + SuggestionSource
{
}

impl<T> DiscoveryStore for T where
    T: DocumentStore
        + EngagementStore
        + TagAssignmentStore
        + FollowGraph
        + UserDirectory
        + SuggestionSource
{
}

pub struct Discovery {
    config: DiscoveryConfig,
    search: SearchService,
    suggest: SuggestionAggregator,
    topics: TopicRecommender,
    users: UserRecommender,
    pending: Arc<PendingWrites>,
}

impl Discovery {
    /// Profiles are re-read from `store` on every user recommendation
    pub fn new<S>(
        config: DiscoveryConfig,
        store: Arc<S>,
        popularity: Arc<dyn PopularityCounter>,
    ) -> Self
    where
        S: DiscoveryStore + 'static,
    {
        let profiles = Arc::new(FullScanProfiles::new(store.clone()));
        Self::with_profiles(config, store, popularity, profiles)
    }

    pub fn with_profiles<S>(
        config: DiscoveryConfig,
        store: Arc<S>,
        popularity: Arc<dyn PopularityCounter>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Self
    where
        S: DiscoveryStore + 'static,
    {
        let pending = Arc::new(PendingWrites::new());
        let search = SearchService::new(&config, store.clone(), popularity.clone())
            .with_pending_writes(pending.clone());
        let suggest = SuggestionAggregator::new(&config, store.clone(), popularity)
            .with_pending_writes(pending.clone());
        let topics = TopicRecommender::new(&config, store.clone(), store.clone());
        let users = UserRecommender::new(&config, profiles, store.clone(), store);

        Self {
            config,
            search,
            suggest,
            topics,
            users,
            pending,
        }
    }

    /// SQLite store and popularity counter in the data directory
    pub fn open(paths: &Paths, config: DiscoveryConfig) -> anyhow::Result<Self> {
        let db_path = paths.db_path();
        let store =
            Arc::new(SqliteStore::new(&db_path)?.with_excerpt_radius(config.excerpt_radius));
        let popularity = Arc::new(SqlitePopularityCounter::new(&db_path)?);
        tracing::debug!(db = %db_path.display(), "opened discovery store");
        Ok(Self::new(config, store, popularity))
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<RankedDocument>> {
        self.search.search(query, limit).await
    }

    pub async fn suggest(&self, keyword: &str, limit: usize) -> Result<Vec<SuggestionEntry>> {
        self.suggest.suggest(keyword, limit).await
    }

    pub async fn recommend_personal_topics(
        &self,
        user_id: UserId,
        top_k: usize,
    ) -> Result<Vec<TopicRecommendation>> {
        self.topics.recommend_personal_topics(user_id, top_k).await
    }

    pub async fn recommend_hot_topics(&self, top_k: usize) -> Result<Vec<TopicRecommendation>> {
        self.topics.recommend_hot_topics(top_k).await
    }

    pub async fn recommend_users(
        &self,
        user_id: UserId,
        top_n: usize,
    ) -> Result<Vec<UserRecommendation>> {
        self.users.recommend_users(user_id, top_n).await
    }

    /// Wait for popularity writes triggered by earlier calls
    pub async fn flush(&self) {
        self.pending.drain().await;
    }
}
