//! In-memory collaborators for tests, demos and small deployments

use crate::collaborator;
use crate::dataset::{Dataset, Engagement};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use discovery_core::tokenizer::{excerpt_around, tokenize_query};
use discovery_core::{
    DiscoveryError, Document, DocumentStore, EngagementStore, FollowGraph, HotKeyword,
    PopularityCounter, Result, SuggestionSource, TagAssignmentStore, TagEngagement, UserDirectory,
    UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

const DEFAULT_EXCERPT_RADIUS: usize = 12;

/// Every read port over plain collections. Only live posts are held.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    documents: Vec<Document>,
    usernames: HashMap<UserId, String>,
    circles: HashMap<i64, String>,
    user_tags: HashMap<UserId, Vec<String>>,
    follows: HashMap<UserId, HashSet<UserId>>,
    engagements: Vec<Engagement>,
    excerpt_radius: usize,
    failing: HashSet<&'static str>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            usernames: HashMap::new(),
            circles: HashMap::new(),
            user_tags: HashMap::new(),
            follows: HashMap::new(),
            engagements: Vec::new(),
            excerpt_radius: DEFAULT_EXCERPT_RADIUS,
            failing: HashSet::new(),
        }
    }

    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut store = Self::new();
        store.documents = dataset.documents();
        for user in &dataset.users {
            store.add_user(user.id, &user.username);
        }
        for circle in &dataset.circles {
            store.add_circle(circle.id, &circle.name);
        }
        for assignment in &dataset.user_tags {
            store.tag_user(assignment.user_id, &assignment.tag);
        }
        for follow in &dataset.follows {
            store.follow(follow.follower_id, follow.followee_id);
        }
        store.engagements = dataset.engagements.clone();
        store
    }

    pub fn with_excerpt_radius(mut self, radius: usize) -> Self {
        self.excerpt_radius = radius;
        self
    }

    pub fn add_document(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn add_user(&mut self, id: UserId, username: &str) {
        self.usernames.insert(id, username.to_string());
    }

    pub fn add_circle(&mut self, id: i64, name: &str) {
        self.circles.insert(id, name.to_string());
    }

    pub fn tag_user(&mut self, user_id: UserId, tag: &str) {
        let tags = self.user_tags.entry(user_id).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    pub fn follow(&mut self, follower: UserId, followee: UserId) {
        self.follows.entry(follower).or_default().insert(followee);
    }

    pub fn engage(&mut self, user_id: UserId, post_id: i64, at: DateTime<Utc>) {
        self.engagements.push(Engagement {
            user_id,
            post_id,
            at,
        });
    }

    /// Make every call through the named collaborator fail
    pub fn fail_collaborator(&mut self, name: &'static str) {
        self.failing.insert(name);
    }

    fn check(&self, name: &'static str) -> Result<()> {
        if self.failing.contains(name) {
            Err(DiscoveryError::upstream(name, "collaborator unavailable"))
        } else {
            Ok(())
        }
    }

    fn newest_first(&self) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.documents.iter().collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        docs
    }

    fn tag_engagements<F>(&self, include: F) -> Vec<TagEngagement>
    where
        F: Fn(&Engagement) -> bool,
    {
        let tags_by_post: HashMap<i64, &Vec<String>> =
            self.documents.iter().map(|d| (d.id, &d.tags)).collect();

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for engagement in self.engagements.iter().filter(|e| include(e)) {
            if let Some(tags) = tags_by_post.get(&engagement.post_id) {
                for tag in tags.iter() {
                    *counts.entry(tag.as_str()).or_insert(0) += 1;
                }
            }
        }

        counts
            .into_iter()
            .map(|(tag, count)| TagEngagement::new(tag, count))
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn sorted_matches<'a>(names: impl Iterator<Item = &'a String>, keyword: &str, limit: usize) -> Vec<String> {
    let needle = keyword.to_lowercase();
    let mut matches: Vec<String> = names
        .filter(|name| contains_ci(name, &needle))
        .cloned()
        .collect();
    matches.sort();
    matches.dedup();
    matches.truncate(limit);
    matches
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn candidates_for_query(
        &self,
        query: &str,
        max_candidates: usize,
    ) -> Result<Vec<Document>> {
        self.check(collaborator::DOCUMENTS)?;

        let mut terms = tokenize_query(query);
        if terms.is_empty() {
            terms.push(query.trim().to_lowercase());
        }

        let hits = |doc: &Document| {
            terms.iter().any(|term| {
                contains_ci(&doc.title, term)
                    || contains_ci(&doc.content, term)
                    || doc.tags.iter().any(|tag| contains_ci(tag, term))
            })
        };

        Ok(self
            .newest_first()
            .into_iter()
            .filter(|doc| hits(doc))
            .take(max_candidates)
            .cloned()
            .collect())
    }

    async fn recent_documents(&self, limit: usize) -> Result<Vec<Document>> {
        self.check(collaborator::DOCUMENTS)?;
        Ok(self
            .newest_first()
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn document_count_for_tag(&self, tag: &str) -> Result<u64> {
        self.check(collaborator::DOCUMENTS)?;
        Ok(self
            .documents
            .iter()
            .filter(|d| d.tags.iter().any(|t| t == tag))
            .count() as u64)
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn engagements_by_user(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<TagEngagement>> {
        self.check(collaborator::ENGAGEMENTS)?;
        Ok(self.tag_engagements(|e| e.user_id == user_id && e.at >= since))
    }

    async fn engagements_global(&self, since: DateTime<Utc>) -> Result<Vec<TagEngagement>> {
        self.check(collaborator::ENGAGEMENTS)?;
        Ok(self.tag_engagements(|e| e.at >= since))
    }
}

#[async_trait]
impl TagAssignmentStore for MemoryStore {
    async fn all_user_tag_profiles(&self) -> Result<HashMap<UserId, Vec<String>>> {
        self.check(collaborator::TAG_ASSIGNMENTS)?;
        Ok(self.user_tags.clone())
    }
}

#[async_trait]
impl FollowGraph for MemoryStore {
    async fn followed_ids(&self, user_id: UserId) -> Result<HashSet<UserId>> {
        self.check(collaborator::FOLLOWS)?;
        Ok(self.follows.get(&user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn usernames(&self, ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        self.check(collaborator::USERS)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.usernames.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}

#[async_trait]
impl SuggestionSource for MemoryStore {
    async fn titles_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        self.check(collaborator::SUGGEST_TITLES)?;
        let needle = keyword.to_lowercase();
        let mut seen = HashSet::new();
        Ok(self
            .newest_first()
            .into_iter()
            .filter(|d| contains_ci(&d.title, &needle))
            .map(|d| d.title.clone())
            .filter(|title| seen.insert(title.clone()))
            .take(limit)
            .collect())
    }

    async fn content_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        self.check(collaborator::SUGGEST_CONTENT)?;
        let mut seen = HashSet::new();
        Ok(self
            .newest_first()
            .into_iter()
            .filter_map(|d| excerpt_around(&d.content, keyword, self.excerpt_radius))
            .filter(|excerpt| seen.insert(excerpt.clone()))
            .take(limit)
            .collect())
    }

    async fn tags_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        self.check(collaborator::SUGGEST_TAGS)?;
        let needle = keyword.to_lowercase();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tag in self.documents.iter().flat_map(|d| d.tags.iter()) {
            if contains_ci(tag, &needle) {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<(&str, usize)> = counts.into_iter().collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        Ok(tags
            .into_iter()
            .take(limit)
            .map(|(tag, _)| tag.to_string())
            .collect())
    }

    async fn usernames_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        self.check(collaborator::SUGGEST_USERS)?;
        Ok(sorted_matches(self.usernames.values(), keyword, limit))
    }

    async fn circles_matching(&self, keyword: &str, limit: usize) -> Result<Vec<String>> {
        self.check(collaborator::SUGGEST_CIRCLES)?;
        Ok(sorted_matches(self.circles.values(), keyword, limit))
    }
}

#[derive(Debug, Default)]
struct RankedSet {
    scores: HashMap<String, f64>,
    expires_at: Option<DateTime<Utc>>,
}

/// Process-local ranked counter
#[derive(Debug, Default)]
pub struct MemoryPopularityCounter {
    keys: RwLock<HashMap<String, RankedSet>>,
    failing: AtomicBool,
}

impl MemoryPopularityCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a member with an explicit score
    pub async fn set_score(&self, key: &str, member: &str, score: f64) {
        let mut keys = self.keys.write().await;
        keys.entry(key.to_string())
            .or_default()
            .scores
            .insert(member.to_string(), score);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DiscoveryError::upstream(
                collaborator::POPULARITY,
                "counter unavailable",
            ))
        } else {
            Ok(())
        }
    }

    fn purge_expired(keys: &mut HashMap<String, RankedSet>, now: DateTime<Utc>) {
        keys.retain(|_, set| set.expires_at.map_or(true, |at| at > now));
    }
}

#[async_trait]
impl PopularityCounter for MemoryPopularityCounter {
    async fn increment(&self, key: &str, member: &str) -> Result<()> {
        self.check()?;
        let mut keys = self.keys.write().await;
        Self::purge_expired(&mut keys, Utc::now());
        *keys
            .entry(key.to_string())
            .or_default()
            .scores
            .entry(member.to_string())
            .or_insert(0.0) += 1.0;
        Ok(())
    }

    async fn top_k(&self, key: &str, k: usize) -> Result<Vec<HotKeyword>> {
        self.check()?;
        let mut keys = self.keys.write().await;
        Self::purge_expired(&mut keys, Utc::now());

        let Some(set) = keys.get(key) else {
            return Ok(Vec::new());
        };
        let mut ranked: Vec<HotKeyword> = set
            .scores
            .iter()
            .map(|(member, &score)| HotKeyword {
                member: member.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.member.cmp(&b.member))
        });
        ranked.truncate(k);
        Ok(ranked)
    }

    async fn expire_after(&self, key: &str, ttl: Duration) -> Result<()> {
        self.check()?;
        let mut keys = self.keys.write().await;
        if let Some(set) = keys.get_mut(key) {
            set.expires_at = Some(Utc::now() + ttl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(id: i64, title: &str, content: &str, tags: &[&str], day: u32) -> Document {
        Document {
            id,
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author_id: 1,
            author_name: "alice".to_string(),
            circle_id: None,
            circle_name: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap(),
            views: 0,
            likes: 0,
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_document(doc(1, "Intro to Vue", "vue is a framework", &["vue", "web"], 1));
        store.add_document(doc(2, "React hooks", "hooks replace classes", &["react", "web"], 2));
        store.add_document(doc(3, "Vue tips", "more vue", &["vue"], 3));
        store.add_user(1, "alice");
        store.add_user(2, "vuefan");
        store.add_circle(10, "Vue Lovers");
        store
    }

    #[tokio::test]
    async fn test_candidates_match_any_term_newest_first() {
        let docs = store().candidates_for_query("vue hooks", 10).await.unwrap();
        let ids: Vec<i64> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_tag_counts_and_suggestions() {
        let store = store();
        assert_eq!(store.document_count_for_tag("web").await.unwrap(), 2);
        assert_eq!(
            store.tags_matching("e", 5).await.unwrap(),
            vec!["vue", "web", "react"]
        );
        assert_eq!(store.usernames_matching("VUE", 5).await.unwrap(), vec!["vuefan"]);
        assert_eq!(
            store.circles_matching("lov", 5).await.unwrap(),
            vec!["Vue Lovers"]
        );
        assert_eq!(
            store.titles_matching("vue", 1).await.unwrap(),
            vec!["Vue tips"]
        );
    }

    #[tokio::test]
    async fn test_engagements_join_tags_within_window() {
        let mut store = store();
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        store.engage(7, 1, recent);
        store.engage(7, 3, recent);
        store.engage(7, 2, old);
        store.engage(8, 2, recent);

        let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut mine = store.engagements_by_user(7, since).await.unwrap();
        mine.sort_by(|a, b| a.tag.cmp(&b.tag));
        assert_eq!(
            mine,
            vec![TagEngagement::new("vue", 2), TagEngagement::new("web", 1)]
        );

        let global = store.engagements_global(since).await.unwrap();
        assert_eq!(global.iter().map(|t| t.count).sum::<u64>(), 5);
    }

    #[tokio::test]
    async fn test_failing_collaborator() {
        let mut store = store();
        store.fail_collaborator(collaborator::FOLLOWS);
        assert!(store.followed_ids(1).await.is_err());
        assert!(store.recent_documents(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_counter_ranks_and_expires() {
        let counter = MemoryPopularityCounter::new();
        counter.increment("hot", "react").await.unwrap();
        counter.increment("hot", "vue").await.unwrap();
        counter.increment("hot", "vue").await.unwrap();

        let top = counter.top_k("hot", 1).await.unwrap();
        assert_eq!(top[0].member, "vue");
        assert_eq!(top[0].score, 2.0);

        counter.expire_after("hot", Duration::zero()).await.unwrap();
        assert!(counter.top_k("hot", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counter_failure_mode() {
        let counter = MemoryPopularityCounter::new();
        counter.set_failing(true);
        assert!(counter.increment("hot", "vue").await.is_err());
        counter.set_failing(false);
        assert!(counter.increment("hot", "vue").await.is_ok());
    }
}
