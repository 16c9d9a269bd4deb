//! Plugin loader.
//!
//! Walks a descriptor table and instantiates one kind of provider per plugin.
//! A plugin whose factory errors or panics is logged, recorded in the
//! [`LoadReport`] and skipped; the rest still load. Having nothing at all to
//! load is the caller's fatal case (see [`LoadReport::into_loaded`]).

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use crate::config::PluginsConfig;
use crate::db::{run_plugin_migrations, Database, MigrationAction};
use crate::error::{Error, Result};

use super::{PluginCommands, PluginDescriptor, PluginUi};

/// A provider instance together with the plugin it came from.
pub struct LoadedPlugin<T: ?Sized> {
    pub id: &'static str,
    pub provider: Box<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PluginLoadFailure {
    pub plugin: String,
    pub reason: String,
}

impl From<PluginLoadFailure> for Error {
    fn from(failure: PluginLoadFailure) -> Self {
        Error::PluginLoad {
            plugin: failure.plugin,
            reason: failure.reason,
        }
    }
}

pub struct LoadReport<T: ?Sized> {
    pub loaded: Vec<LoadedPlugin<T>>,
    pub failures: Vec<PluginLoadFailure>,
    kind: &'static str,
}

impl<T: ?Sized> LoadReport<T> {
    pub fn ids(&self) -> Vec<&'static str> {
        self.loaded.iter().map(|plugin| plugin.id).collect()
    }

    /// The loaded providers, or [`Error::NoPlugins`] when there are none.
    pub fn into_loaded(self) -> Result<Vec<LoadedPlugin<T>>> {
        if self.loaded.is_empty() {
            return Err(Error::NoPlugins { kind: self.kind });
        }
        Ok(self.loaded)
    }
}

/// Load every UI provider in `descriptors`.
pub fn load_plugin_uis(
    descriptors: &[PluginDescriptor],
    config: &PluginsConfig,
) -> LoadReport<dyn PluginUi> {
    load_with(descriptors, config, "ui", |descriptor| descriptor.ui)
}

/// Load every command provider in `descriptors`.
pub fn load_plugin_commands(
    descriptors: &[PluginDescriptor],
    config: &PluginsConfig,
) -> LoadReport<dyn PluginCommands> {
    load_with(descriptors, config, "command", |descriptor| descriptor.commands)
}

fn load_with<T: ?Sized>(
    descriptors: &[PluginDescriptor],
    config: &PluginsConfig,
    kind: &'static str,
    pick: impl Fn(&PluginDescriptor) -> Option<fn() -> Result<Box<T>>>,
) -> LoadReport<T> {
    let mut loaded = Vec::new();
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    for descriptor in descriptors {
        if descriptor.is_hidden() {
            continue;
        }
        if config.is_disabled(descriptor.id) {
            tracing::debug!(plugin = descriptor.id, kind, "plugin disabled by config");
            continue;
        }
        let Some(factory) = pick(descriptor) else {
            continue;
        };
        if !seen.insert(descriptor.id) {
            failures.push(record_failure(descriptor.id, kind, "duplicate plugin id".to_string()));
            continue;
        }

        match guarded(factory) {
            Ok(provider) => {
                tracing::debug!(plugin = descriptor.id, kind, "plugin loaded");
                loaded.push(LoadedPlugin {
                    id: descriptor.id,
                    provider,
                });
            }
            Err(reason) => failures.push(record_failure(descriptor.id, kind, reason)),
        }
    }

    LoadReport {
        loaded,
        failures,
        kind,
    }
}

/// Log one warning for a plugin that will be absent from the report.
fn record_failure(plugin: &'static str, kind: &'static str, reason: String) -> PluginLoadFailure {
    let failure = PluginLoadFailure {
        plugin: plugin.to_string(),
        reason,
    };
    let err = Error::from(failure.clone());
    tracing::warn!(plugin, kind, error = %err, "failed to load plugin");
    failure
}

/// Run a plugin-supplied closure, turning both errors and panics into a message.
pub(crate) fn guarded<T>(work: impl FnOnce() -> Result<T>) -> std::result::Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

/// Look up a visible plugin by id.
pub fn find_descriptor<'a>(
    descriptors: &'a [PluginDescriptor],
    id: &str,
) -> Result<&'a PluginDescriptor> {
    descriptors
        .iter()
        .find(|descriptor| descriptor.id == id && !descriptor.is_hidden())
        .ok_or_else(|| Error::UnknownPlugin(id.to_string()))
}

/// Resolve `plugin_id` and run its create/drop hook named by `action`.
pub fn migrate_plugin(
    db: &Database,
    descriptors: &[PluginDescriptor],
    plugin_id: &str,
    action: &str,
) -> Result<MigrationAction> {
    let action: MigrationAction = action.parse()?;
    let descriptor = find_descriptor(descriptors, plugin_id)?;
    let factory = descriptor
        .migrations
        .ok_or_else(|| Error::NoMigrations(plugin_id.to_string()))?;
    let migrations = factory();
    run_plugin_migrations(db, descriptor.id, migrations.as_ref(), action)?;
    Ok(action)
}
