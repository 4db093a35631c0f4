//! Personalized and global topic recommendation
//!
//! Ordering uses engagement inside the window; the displayed `post_count` is
//! the live document count for the tag, looked up only for the selected tags.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use discovery_core::{
    DiscoveryConfig, DocumentStore, EngagementStore, Result, TagEngagement, TopicRecommendation,
    UserId,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Midnight UTC of the day containing `now`
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub struct TopicRecommender {
    documents: Arc<dyn DocumentStore>,
    engagements: Arc<dyn EngagementStore>,
    personal_top_k: usize,
    personal_window: Duration,
    hot_top_k: usize,
}

impl TopicRecommender {
    pub fn new(
        config: &DiscoveryConfig,
        documents: Arc<dyn DocumentStore>,
        engagements: Arc<dyn EngagementStore>,
    ) -> Self {
        Self {
            documents,
            engagements,
            personal_top_k: config.personal_topics_top_k,
            personal_window: Duration::days(config.personal_window_days),
            hot_top_k: config.hot_topics_top_k,
        }
    }

    pub async fn recommend_personal_topics(
        &self,
        user_id: UserId,
        top_k: usize,
    ) -> Result<Vec<TopicRecommendation>> {
        self.recommend_personal_topics_at(user_id, top_k, Utc::now())
            .await
    }

    pub async fn recommend_personal_topics_at(
        &self,
        user_id: UserId,
        top_k: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopicRecommendation>> {
        let top_k = if top_k == 0 { self.personal_top_k } else { top_k };
        let since = now - self.personal_window;
        let rows = self
            .engagements
            .engagements_by_user(user_id, since)
            .await?;
        self.finish(rows, top_k).await
    }

    pub async fn recommend_hot_topics(&self, top_k: usize) -> Result<Vec<TopicRecommendation>> {
        self.recommend_hot_topics_at(top_k, Utc::now()).await
    }

    pub async fn recommend_hot_topics_at(
        &self,
        top_k: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopicRecommendation>> {
        let top_k = if top_k == 0 { self.hot_top_k } else { top_k };
        let rows = self
            .engagements
            .engagements_global(start_of_day(now))
            .await?;
        self.finish(rows, top_k).await
    }

    async fn finish(
        &self,
        rows: Vec<TagEngagement>,
        top_k: usize,
    ) -> Result<Vec<TopicRecommendation>> {
        let mut topics = Vec::new();
        for (tag, engagement) in rank_tags(rows, top_k) {
            let post_count = self.documents.document_count_for_tag(&tag).await?;
            topics.push(TopicRecommendation {
                tag,
                post_count,
                engagement,
            });
        }
        Ok(topics)
    }
}

/// Sum per tag, order by engagement (ties by name), keep `top_k`
fn rank_tags(rows: Vec<TagEngagement>, top_k: usize) -> Vec<(String, u64)> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for row in rows {
        *totals.entry(row.tag).or_insert(0) += row.count;
    }

    let mut ranked: Vec<(String, u64)> = totals.into_iter().filter(|(_, c)| *c > 0).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(top_k);
    ranked
}
