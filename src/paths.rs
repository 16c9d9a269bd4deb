//! Application-data layout for keeper
//!
//! All state lives under one root directory:
//!
//! ```text
//! <root>/                # $KEEPER_HOME, or the platform data dir for "keeper"
//!   keeper.db            # SQLite store (trackables, events, plugin tables)
//!   keeper.toml          # User configuration
//!   identity.json        # Local identity record
//!   keeper.log           # TUI log output
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};

/// Environment variable overriding the application-data root
pub const HOME_ENV: &str = "KEEPER_HOME";

pub const DB_FILENAME: &str = "keeper.db";
pub const CONFIG_FILENAME: &str = "keeper.toml";
pub const IDENTITY_FILENAME: &str = "identity.json";
pub const LOG_FILENAME: &str = "keeper.log";

#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Resolve the root from `KEEPER_HOME`, falling back to the platform data dir.
    pub fn resolve() -> Result<Self> {
        if let Ok(raw) = std::env::var(HOME_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Ok(Self::at(trimmed));
            }
        }

        let dirs = ProjectDirs::from("", "", "keeper").ok_or_else(|| {
            Error::InvalidConfig(format!(
                "cannot determine a home directory; set {HOME_ENV}"
            ))
        })?;
        Ok(Self::at(dirs.data_dir()))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(DB_FILENAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    pub fn identity_path(&self) -> PathBuf {
        self.root.join(IDENTITY_FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layout_is_rooted() {
        let paths = AppPaths::at("/tmp/keeper-home");
        assert_eq!(paths.db_path(), PathBuf::from("/tmp/keeper-home/keeper.db"));
        assert_eq!(
            paths.identity_path(),
            PathBuf::from("/tmp/keeper-home/identity.json")
        );
        assert_eq!(paths.config_path().file_name().unwrap(), "keeper.toml");
    }

    #[test]
    fn ensure_creates_nested_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::at(dir.path().join("a").join("b"));
        paths.ensure().expect("ensure");
        assert!(paths.root().is_dir());
    }
}
