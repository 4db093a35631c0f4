//! Search flow: retrieve, rank, record popularity

use crate::bm25::Bm25Ranker;
use crate::retriever::CandidateRetriever;
use discovery_core::{
    record_in_background, DiscoveryConfig, DocumentStore, PendingWrites, PopularityCounter,
    RankedDocument, Result,
};
use std::sync::Arc;

pub struct SearchService {
    retriever: CandidateRetriever,
    ranker: Bm25Ranker,
    popularity: Arc<dyn PopularityCounter>,
    popularity_key: String,
    popularity_ttl: chrono::Duration,
    pending: Arc<PendingWrites>,
}

impl SearchService {
    pub fn new(
        config: &DiscoveryConfig,
        documents: Arc<dyn DocumentStore>,
        popularity: Arc<dyn PopularityCounter>,
    ) -> Self {
        Self {
            retriever: CandidateRetriever::new(
                documents,
                config.max_candidates,
                config.retrieval_timeout(),
            ),
            ranker: Bm25Ranker::new(config.bm25),
            popularity,
            popularity_key: config.popularity_key.clone(),
            popularity_ttl: config.popularity_ttl(),
            pending: Arc::new(PendingWrites::new()),
        }
    }

    /// Share the tracker for detached popularity writes with other services
    pub fn with_pending_writes(mut self, pending: Arc<PendingWrites>) -> Self {
        self.pending = pending;
        self
    }

    pub fn pending_writes(&self) -> &Arc<PendingWrites> {
        &self.pending
    }

    /// Ranked documents for `query`; `None`/`Some(0)` means no limit
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<RankedDocument>> {
        let candidates = self.retriever.retrieve(query).await?;
        let ranked = self.ranker.rank(query, candidates, limit);

        let query = query.trim();
        if !query.is_empty() && !ranked.is_empty() {
            self.pending.push(record_in_background(
                self.popularity.clone(),
                self.popularity_key.clone(),
                query.to_string(),
                self.popularity_ttl,
            ));
        }

        tracing::debug!(query, results = ranked.len(), "search complete");
        Ok(ranked)
    }
}
