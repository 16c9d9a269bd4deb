//! Plugin-owned table hooks.
//!
//! A plugin may ship create/drop hooks for its own tables. They are invoked
//! by explicit action name; there is no version tracking.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::plugin::PluginMigrations;

use super::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationAction {
    Create,
    Drop,
}

impl FromStr for MigrationAction {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "create" => Ok(MigrationAction::Create),
            "drop" => Ok(MigrationAction::Drop),
            other => Err(Error::InvalidMigrationAction(other.to_string())),
        }
    }
}

impl fmt::Display for MigrationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationAction::Create => write!(f, "create"),
            MigrationAction::Drop => write!(f, "drop"),
        }
    }
}

/// Run one plugin's create or drop hook in a single transaction.
pub fn run_plugin_migrations(
    db: &Database,
    plugin_id: &str,
    migrations: &dyn PluginMigrations,
    action: MigrationAction,
) -> Result<()> {
    db.with_transaction(|tx| match action {
        MigrationAction::Create => migrations.create_tables(tx),
        MigrationAction::Drop => migrations.drop_tables(tx),
    })?;
    tracing::info!(plugin = plugin_id, %action, "plugin migrations applied");
    Ok(())
}
