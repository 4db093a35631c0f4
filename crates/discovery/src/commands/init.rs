use discovery::Paths;
use discovery_core::DiscoveryConfig;
use discovery_store::{SqlitePopularityCounter, SqliteStore};
use std::path::Path;

pub fn run(config: Option<&Path>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let written = initialize(&paths, config)?;

    println!("✓ Initialized discovery in {}", paths.home.display());
    println!("  database: {}", paths.db_path().display());
    if written {
        println!("  config:   {} (defaults)", paths.config_path().display());
    }
    Ok(())
}

/// Creates schema and writes a default config unless one exists.
/// Returns whether the config file was written.
fn initialize(paths: &Paths, config: Option<&Path>) -> anyhow::Result<bool> {
    paths.ensure_home()?;
    SqliteStore::new(paths.db_path())?;
    SqlitePopularityCounter::new(paths.db_path())?;

    // A config passed explicitly is only validated, never copied
    if let Some(path) = config {
        DiscoveryConfig::load(path)?;
        return Ok(false);
    }

    let config_path = paths.config_path();
    if config_path.exists() {
        return Ok(false);
    }
    let json = serde_json::to_string_pretty(&DiscoveryConfig::default())?;
    std::fs::write(&config_path, json)?;
    tracing::info!(path = %config_path.display(), "wrote default config");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_db_and_config() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::at(temp.path().join("home"));

        assert!(initialize(&paths, None).unwrap());
        assert!(paths.db_path().exists());

        let config = paths.load_config(None).unwrap();
        assert_eq!(config.user_recommend_top_n, 2);
    }

    #[test]
    fn test_initialize_keeps_existing_config() {
        let temp = TempDir::new().unwrap();
        let paths = Paths::at(temp.path());
        std::fs::write(paths.config_path(), r#"{"hot_topics_top_k": 9}"#).unwrap();

        assert!(!initialize(&paths, None).unwrap());
        assert_eq!(paths.load_config(None).unwrap().hot_topics_top_k, 9);
    }
}
