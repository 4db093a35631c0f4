//! Shared types, configuration and collaborator ports for content discovery

mod config;
mod error;
mod popularity;
pub mod ports;
pub mod tokenizer;
mod types;

pub use config::{Bm25Params, DiscoveryConfig, SourceFailurePolicy};
pub use error::{with_budget, BoxError, DiscoveryError, Result};
pub use popularity::{record_in_background, PendingWrites};
pub use ports::{
    DocumentStore, EngagementStore, FollowGraph, PopularityCounter, SuggestionSource,
    TagAssignmentStore, UserDirectory,
};
pub use types::{
    Document, HotKeyword, RankedDocument, SuggestionEntry, SuggestionKind, TagEngagement,
    TopicRecommendation, UserId, UserRecommendation,
};
