//! Content discovery: ranked search, typeahead suggestions, topic and people
//! recommendation over a community-post store.

pub mod engine;
pub mod paths;

pub use engine::{Discovery, DiscoveryStore};
pub use paths::Paths;
