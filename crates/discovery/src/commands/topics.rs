use super::{open, print_json};
use discovery_core::UserId;
use std::path::Path;

pub async fn run(config: Option<&Path>, user: UserId, top_k: usize) -> anyhow::Result<()> {
    let engine = open(config)?;
    print_json(&engine.recommend_personal_topics(user, top_k).await?)
}

pub async fn run_hot(config: Option<&Path>, top_k: usize) -> anyhow::Result<()> {
    let engine = open(config)?;
    print_json(&engine.recommend_hot_topics(top_k).await?)
}
