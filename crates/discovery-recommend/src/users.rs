//! People recommendation by tag-profile cosine similarity

use crate::cosine::cosine_similarity;
use crate::profile::ProfileSource;
use discovery_core::{
    with_budget, DiscoveryConfig, FollowGraph, Result, UserDirectory, UserId, UserRecommendation,
};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

pub struct UserRecommender {
    profiles: Arc<dyn ProfileSource>,
    follows: Arc<dyn FollowGraph>,
    directory: Arc<dyn UserDirectory>,
    default_top_n: usize,
    scan_timeout: Duration,
}

impl UserRecommender {
    pub fn new(
        config: &DiscoveryConfig,
        profiles: Arc<dyn ProfileSource>,
        follows: Arc<dyn FollowGraph>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            profiles,
            follows,
            directory,
            default_top_n: config.user_recommend_top_n,
            scan_timeout: config.profile_scan_timeout(),
        }
    }

    /// Most similar users the requester does not already follow.
    ///
    /// A requester with no tags gets an empty list. Candidates with zero
    /// similarity stay eligible and rank last; ties go to the lower user id.
    pub async fn recommend_users(
        &self,
        user_id: UserId,
        top_n: usize,
    ) -> Result<Vec<UserRecommendation>> {
        let top_n = if top_n == 0 { self.default_top_n } else { top_n };

        let (table, followed) = tokio::try_join!(
            with_budget(
                "profile scan",
                self.scan_timeout,
                self.profiles.load_profiles()
            ),
            self.follows.followed_ids(user_id),
        )?;

        let Some(mine) = table.get(&user_id).filter(|p| !p.is_empty()) else {
            tracing::debug!(user_id, "requester has no interest profile");
            return Ok(Vec::new());
        };

        let mut scored: Vec<(UserId, f64)> = table
            .iter()
            .filter(|(id, _)| **id != user_id && !followed.contains(*id))
            .map(|(id, profile)| (*id, cosine_similarity(mine, profile)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_n);

        if scored.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = scored.iter().map(|(id, _)| *id).collect();
        let mut names = self.directory.usernames(&ids).await?;
        tracing::debug!(
            user_id,
            candidates = table.len(),
            selected = ids.len(),
            "ranked similar users"
        );

        Ok(scored
            .into_iter()
            .map(|(id, similarity)| UserRecommendation {
                user_id: id,
                username: names.remove(&id),
                similarity,
            })
            .collect())
    }
}
