use super::print_json;
use discovery::Paths;
use discovery_store::SqliteStore;
use std::collections::BTreeMap;

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    if !paths.db_path().exists() {
        anyhow::bail!(
            "no database at {}; run `discovery init` first",
            paths.db_path().display()
        );
    }

    let store = SqliteStore::new(paths.db_path())?;
    let stats: BTreeMap<String, serde_json::Value> = store.get_stats()?.into_iter().collect();
    print_json(&stats)
}
