//! Collaborator adapters: SQLite-backed and in-memory stores

mod dataset;
mod memory;
mod popularity;
mod sqlite;

pub use dataset::{CircleRecord, Dataset, Engagement, Follow, PostRecord, UserRecord, UserTag};
pub use memory::{MemoryPopularityCounter, MemoryStore};
pub use popularity::SqlitePopularityCounter;
pub use sqlite::SqliteStore;

/// Names reported in `DiscoveryError::Upstream`
pub mod collaborator {
    pub const DOCUMENTS: &str = "document_store";
    pub const ENGAGEMENTS: &str = "engagement_store";
    pub const TAG_ASSIGNMENTS: &str = "tag_assignment_store";
    pub const FOLLOWS: &str = "follow_graph";
    pub const USERS: &str = "user_directory";
    pub const POPULARITY: &str = "popularity_counter";
    pub const SUGGEST_TITLES: &str = "suggest.title";
    pub const SUGGEST_CONTENT: &str = "suggest.content";
    pub const SUGGEST_TAGS: &str = "suggest.tag";
    pub const SUGGEST_USERS: &str = "suggest.user";
    pub const SUGGEST_CIRCLES: &str = "suggest.circle";
}
