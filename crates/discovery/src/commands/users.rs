use super::{open, print_json};
use discovery_core::UserId;
use std::path::Path;

pub async fn run(config: Option<&Path>, user: UserId, top_n: usize) -> anyhow::Result<()> {
    let engine = open(config)?;
    print_json(&engine.recommend_users(user, top_n).await?)
}
