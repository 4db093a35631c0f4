//! Interest profiles: one sparse tag-weight vector per user

use async_trait::async_trait;
use discovery_core::{Result, TagAssignmentStore, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Tag name → weight (1.0 marks presence)
pub type InterestProfile = HashMap<String, f64>;

pub type ProfileTable = HashMap<UserId, InterestProfile>;

/// Presence vectors from raw tag assignments
pub fn build_profiles(assignments: HashMap<UserId, Vec<String>>) -> ProfileTable {
    assignments
        .into_iter()
        .map(|(user_id, tags)| {
            let profile: InterestProfile = tags.into_iter().map(|tag| (tag, 1.0)).collect();
            (user_id, profile)
        })
        .collect()
}

/// Where recommendation reads the profile table from
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn load_profiles(&self) -> Result<Arc<ProfileTable>>;
}

/// Re-reads the whole tag-assignment store on every call
pub struct FullScanProfiles {
    store: Arc<dyn TagAssignmentStore>,
}

impl FullScanProfiles {
    pub fn new(store: Arc<dyn TagAssignmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProfileSource for FullScanProfiles {
    async fn load_profiles(&self) -> Result<Arc<ProfileTable>> {
        let assignments = self.store.all_user_tag_profiles().await?;
        tracing::debug!(users = assignments.len(), "scanned tag assignments");
        Ok(Arc::new(build_profiles(assignments)))
    }
}

/// Read-mostly cache over another source, refreshed after `ttl`
pub struct CachedProfiles {
    inner: Arc<dyn ProfileSource>,
    ttl: Duration,
    cached: RwLock<Option<(Instant, Arc<ProfileTable>)>>,
}

impl CachedProfiles {
    pub fn new(inner: Arc<dyn ProfileSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[async_trait]
impl ProfileSource for CachedProfiles {
    async fn load_profiles(&self) -> Result<Arc<ProfileTable>> {
        if let Some((loaded_at, table)) = self.cached.read().await.as_ref() {
            if loaded_at.elapsed() < self.ttl {
                return Ok(table.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some((loaded_at, table)) = cached.as_ref() {
            if loaded_at.elapsed() < self.ttl {
                return Ok(table.clone());
            }
        }

        let table = self.inner.load_profiles().await?;
        *cached = Some((Instant::now(), table.clone()));
        Ok(table)
    }
}
