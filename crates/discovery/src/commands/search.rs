use super::{open, print_json};
use std::path::Path;

pub async fn run(config: Option<&Path>, query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let engine = open(config)?;
    let results = engine.search(query, limit).await?;
    engine.flush().await;
    print_json(&results)
}
