//! Search-suggestion fan-out and merge

mod aggregator;

pub use aggregator::{SourceOutcome, SuggestionAggregator};
