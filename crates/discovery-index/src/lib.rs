//! BM25 ranking over bounded candidate sets

mod bm25;
mod retriever;
mod search;

pub use bm25::{query_terms, weighted_terms, Bm25Ranker};
pub use retriever::CandidateRetriever;
pub use search::SearchService;
