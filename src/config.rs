//! Configuration loading and management
//!
//! Handles parsing of `keeper.toml` in the application-data root.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Plugin selection
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Shell presentation
    #[serde(default)]
    pub ui: UiConfig,

    /// Tasks configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Plugin-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Plugin ids skipped by both the UI and the command loaders
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl PluginsConfig {
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.iter().any(|entry| entry.trim() == id)
    }
}

/// Shell-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Width of the plugin selector column
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,

    /// Open the keybindings overlay on startup
    #[serde(default)]
    pub help_on_start: bool,
}

fn default_sidebar_width() -> u16 {
    24
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sidebar_width: default_sidebar_width(),
            help_on_start: false,
        }
    }
}

/// Task completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Event type recorded when a task is completed
    #[serde(default = "default_toggle_on")]
    pub toggle_on: String,

    /// Event type recorded when a completion is reverted
    #[serde(default = "default_toggle_off")]
    pub toggle_off: String,
}

fn default_toggle_on() -> String {
    "completed".to_string()
}

fn default_toggle_off() -> String {
    "uncompleted".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            toggle_on: default_toggle_on(),
            toggle_off: default_toggle_off(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration, using defaults when the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.ui.validate()?;
        self.tasks.validate()?;
        for id in &self.plugins.disabled {
            if id.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "plugins.disabled cannot include empty entries".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl UiConfig {
    fn validate(&self) -> Result<()> {
        if !(12..=60).contains(&self.sidebar_width) {
            return Err(Error::InvalidConfig(format!(
                "ui.sidebar_width must be between 12 and 60 (got {})",
                self.sidebar_width
            )));
        }
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        let on = self.toggle_on.trim();
        let off = self.toggle_off.trim();
        if on.is_empty() || off.is_empty() {
            return Err(Error::InvalidConfig(
                "tasks.toggle_on and tasks.toggle_off cannot be empty".to_string(),
            ));
        }
        if on == off {
            return Err(Error::InvalidConfig(format!(
                "tasks.toggle_on and tasks.toggle_off must differ (both '{on}')"
            )));
        }
        Ok(())
    }
}
