//! Application context shared by the shell, the CLI and every plugin.

use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::identity::Identity;
use crate::paths::AppPaths;
use crate::trackables::TrackableStore;

/// Everything a component needs to reach configuration, identity and storage.
///
/// Built once at startup and handed out by reference.
#[derive(Debug, Clone)]
pub struct AppContext {
    paths: AppPaths,
    config: Config,
    identity: Identity,
    db: Database,
}

impl AppContext {
    /// Ensure directories, load config, provision identity and create the core schema.
    pub fn init(paths: AppPaths) -> Result<Self> {
        paths.ensure()?;
        let config = Config::load_or_default(&paths.config_path());
        let identity = Identity::ensure(&paths.identity_path())?;
        let db = Database::new(paths.db_path());
        db.init_schema()?;
        tracing::debug!(root = %paths.root().display(), "application context ready");

        Ok(Self {
            paths,
            config,
            identity,
            db,
        })
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Trackable API handle over this context's database.
    pub fn trackables(&self) -> TrackableStore {
        TrackableStore::new(self.db.clone())
    }
}
