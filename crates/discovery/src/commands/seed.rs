use discovery::Paths;
use discovery_store::{Dataset, SqliteStore};
use std::path::Path;

pub fn run(file: &Path) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    paths.ensure_home()?;

    let dataset = Dataset::from_json_file(file)?;
    let store = SqliteStore::new(paths.db_path())?;
    let posts = store.import(&dataset)?;

    println!(
        "✓ Imported {} posts, {} users, {} engagements from {}",
        posts,
        dataset.users.len(),
        dataset.engagements.len(),
        file.display()
    );
    Ok(())
}
