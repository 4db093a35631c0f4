//! Configuration for ranking, suggestion and recommendation

use crate::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// BM25 tuning parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f64,
    /// Length-normalization strength
    pub b: f64,
}

impl Bm25Params {
    pub fn new() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self::new()
    }
}

/// How the suggestion fan-out reacts to a failing source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFailurePolicy {
    /// One failing source fails the whole request
    #[default]
    AbortAll,
    /// Failing sources are logged and contribute nothing
    SkipFailed,
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub bm25: Bm25Params,

    /// Candidate set cap per search
    pub max_candidates: usize,

    /// Used when a suggestion request passes limit 0
    pub default_suggest_limit: usize,

    /// Characters kept either side of a content match
    pub excerpt_radius: usize,

    /// Hot keywords scanned when filtering by a non-empty keyword
    pub hot_scan_depth: usize,

    /// Ranked-counter key for search popularity
    pub popularity_key: String,

    /// Rolling expiry applied after each increment
    pub popularity_ttl_days: i64,

    pub personal_topics_top_k: usize,

    /// Engagement window for personalized topics
    pub personal_window_days: i64,

    pub hot_topics_top_k: usize,

    pub user_recommend_top_n: usize,

    pub retrieval_timeout_ms: u64,

    pub profile_scan_timeout_ms: u64,

    pub suggest_failure_policy: SourceFailurePolicy,
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self {
            bm25: Bm25Params::new(),
            max_candidates: 800,
            default_suggest_limit: 10,
            excerpt_radius: 12,
            hot_scan_depth: 100,
            popularity_key: "search:hot_keywords".to_string(),
            popularity_ttl_days: 7,
            personal_topics_top_k: 4,
            personal_window_days: 7,
            hot_topics_top_k: 3,
            user_recommend_top_n: 2,
            retrieval_timeout_ms: 2_000,
            profile_scan_timeout_ms: 5_000,
            suggest_failure_policy: SourceFailurePolicy::AbortAll,
        }
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| DiscoveryError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bm25.k1 < 0.0 {
            return Err(DiscoveryError::Config("bm25.k1 must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(DiscoveryError::Config("bm25.b must be within 0..=1".into()));
        }
        if self.max_candidates == 0 {
            return Err(DiscoveryError::Config("max_candidates must be > 0".into()));
        }
        if self.default_suggest_limit == 0 {
            return Err(DiscoveryError::Config(
                "default_suggest_limit must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    pub fn profile_scan_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_scan_timeout_ms)
    }

    pub fn popularity_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.popularity_ttl_days)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new()
    }
}
