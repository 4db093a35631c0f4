use super::{open, print_json};
use std::path::Path;

pub async fn run(config: Option<&Path>, keyword: &str, limit: usize) -> anyhow::Result<()> {
    let engine = open(config)?;
    let entries = engine.suggest(keyword, limit).await?;
    engine.flush().await;
    print_json(&entries)
}
