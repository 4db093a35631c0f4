//! Bounded candidate retrieval

use discovery_core::{with_budget, Document, DocumentStore, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct CandidateRetriever {
    store: Arc<dyn DocumentStore>,
    max_candidates: usize,
    timeout: Duration,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn DocumentStore>, max_candidates: usize, timeout: Duration) -> Self {
        Self {
            store,
            max_candidates,
            timeout,
        }
    }

    /// Coarse candidate set for `query`; recent documents when the query is blank
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let query = query.trim();
        let fetch = async {
            if query.is_empty() {
                self.store.recent_documents(self.max_candidates).await
            } else {
                self.store
                    .candidates_for_query(query, self.max_candidates)
                    .await
            }
        };

        let mut candidates = with_budget("candidate retrieval", self.timeout, fetch).await?;
        candidates.truncate(self.max_candidates);
        tracing::debug!(query, candidates = candidates.len(), "retrieved candidates");
        Ok(candidates)
    }
}
