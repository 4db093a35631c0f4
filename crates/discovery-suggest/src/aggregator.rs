//! Suggestion aggregator
//!
//! A non-empty keyword fans out to five typed lookups plus the hot-keyword
//! source. All six run concurrently and all are awaited before merging; the
//! configured [`SourceFailurePolicy`] then decides whether one failed source
//! fails the request.

use discovery_core::{
    record_in_background, DiscoveryConfig, DiscoveryError, PendingWrites, PopularityCounter,
    Result, SourceFailurePolicy, SuggestionEntry, SuggestionKind, SuggestionSource,
};
use std::collections::HashSet;
use std::sync::Arc;

/// What one source produced for one request
#[derive(Debug)]
pub struct SourceOutcome {
    pub kind: SuggestionKind,
    pub result: Result<Vec<String>>,
}

pub struct SuggestionAggregator {
    sources: Arc<dyn SuggestionSource>,
    popularity: Arc<dyn PopularityCounter>,
    default_limit: usize,
    hot_scan_depth: usize,
    popularity_key: String,
    popularity_ttl: chrono::Duration,
    policy: SourceFailurePolicy,
    pending: Arc<PendingWrites>,
}

impl SuggestionAggregator {
    pub fn new(
        config: &DiscoveryConfig,
        sources: Arc<dyn SuggestionSource>,
        popularity: Arc<dyn PopularityCounter>,
    ) -> Self {
        Self {
            sources,
            popularity,
            default_limit: config.default_suggest_limit,
            hot_scan_depth: config.hot_scan_depth,
            popularity_key: config.popularity_key.clone(),
            popularity_ttl: config.popularity_ttl(),
            policy: config.suggest_failure_policy,
            pending: Arc::new(PendingWrites::new()),
        }
    }

    pub fn with_policy(mut self, policy: SourceFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_pending_writes(mut self, pending: Arc<PendingWrites>) -> Self {
        self.pending = pending;
        self
    }

    pub fn pending_writes(&self) -> &Arc<PendingWrites> {
        &self.pending
    }

    /// Suggestions for `keyword`; `limit` 0 falls back to the configured default
    pub async fn suggest(&self, keyword: &str, limit: usize) -> Result<Vec<SuggestionEntry>> {
        let limit = if limit == 0 { self.default_limit } else { limit };
        let keyword = keyword.trim();

        if keyword.is_empty() {
            return Ok(self
                .hot_keywords(limit)
                .await
                .into_iter()
                .map(|member| SuggestionEntry::new(member, SuggestionKind::Hot))
                .collect());
        }

        let outcomes = self.fan_out(keyword, limit).await;
        let merged = self.merge(outcomes, limit)?;

        if !merged.is_empty() {
            self.pending.push(record_in_background(
                self.popularity.clone(),
                self.popularity_key.clone(),
                keyword.to_string(),
                self.popularity_ttl,
            ));
        }

        tracing::debug!(keyword, suggestions = merged.len(), "suggest complete");
        Ok(merged)
    }

    /// Query every source concurrently, in merge order
    pub async fn fan_out(&self, keyword: &str, limit: usize) -> Vec<SourceOutcome> {
        let (title, content, tag, user, circle, hot) = tokio::join!(
            self.sources.titles_matching(keyword, limit),
            self.sources.content_matching(keyword, limit),
            self.sources.tags_matching(keyword, limit),
            self.sources.usernames_matching(keyword, limit),
            self.sources.circles_matching(keyword, limit),
            self.hot_matching(keyword, limit),
        );

        vec![
            SourceOutcome { kind: SuggestionKind::Title, result: title },
            SourceOutcome { kind: SuggestionKind::Content, result: content },
            SourceOutcome { kind: SuggestionKind::Tag, result: tag },
            SourceOutcome { kind: SuggestionKind::User, result: user },
            SourceOutcome { kind: SuggestionKind::Circle, result: circle },
            SourceOutcome { kind: SuggestionKind::Hot, result: Ok(hot) },
        ]
    }

    fn merge(&self, outcomes: Vec<SourceOutcome>, limit: usize) -> Result<Vec<SuggestionEntry>> {
        let mut seen: HashSet<(String, SuggestionKind)> = HashSet::new();
        let mut merged = Vec::new();
        let mut first_error: Option<DiscoveryError> = None;

        for outcome in outcomes {
            let keywords = match outcome.result {
                Ok(keywords) => keywords,
                Err(e) => {
                    tracing::warn!(source = %outcome.kind, error = %e, "suggestion source failed");
                    first_error.get_or_insert(e);
                    continue;
                }
            };

            for keyword in keywords.into_iter().take(limit) {
                if seen.insert((keyword.clone(), outcome.kind)) {
                    merged.push(SuggestionEntry::new(keyword, outcome.kind));
                }
            }
        }

        if let Some(e) = first_error {
            if self.policy == SourceFailurePolicy::AbortAll {
                return Err(e);
            }
        }

        merged.truncate(limit);
        Ok(merged)
    }

    /// Top hot keywords; counter failures degrade to an empty list
    async fn hot_keywords(&self, limit: usize) -> Vec<String> {
        match self.popularity.top_k(&self.popularity_key, limit).await {
            Ok(hot) => hot.into_iter().map(|h| h.member).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "hot keyword lookup failed");
                Vec::new()
            }
        }
    }

    async fn hot_matching(&self, keyword: &str, limit: usize) -> Vec<String> {
        let needle = keyword.to_lowercase();
        self.hot_keywords(self.hot_scan_depth)
            .await
            .into_iter()
            .filter(|member| member.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}
