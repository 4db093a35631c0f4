//! Tag-based topic and people recommendation

mod cosine;
mod profile;
mod topics;
mod users;

pub use cosine::cosine_similarity;
pub use profile::{
    build_profiles, CachedProfiles, FullScanProfiles, InterestProfile, ProfileSource,
    ProfileTable,
};
pub use topics::{start_of_day, TopicRecommender};
pub use users::UserRecommender;
