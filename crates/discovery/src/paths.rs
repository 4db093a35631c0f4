//! Data directory resolution

use anyhow::Context;
use discovery_core::DiscoveryConfig;
use std::path::{Path, PathBuf};

/// Overrides the data directory
pub const HOME_ENV: &str = "DISCOVERY_HOME";

/// Resolves the database and config file locations
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// `$DISCOVERY_HOME`, else `~/.discovery`
    pub fn new() -> std::io::Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(home));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::at(home.join(".discovery")))
    }

    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn db_path(&self) -> PathBuf {
        self.home.join("discovery.db")
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.json")
    }

    pub fn ensure_home(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.home)
    }

    /// An explicit file must exist; the default location is optional
    pub fn load_config(&self, explicit: Option<&Path>) -> anyhow::Result<DiscoveryConfig> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = self.config_path();
                if !path.exists() {
                    return Ok(DiscoveryConfig::default());
                }
                path
            }
        };

        let config = DiscoveryConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}
