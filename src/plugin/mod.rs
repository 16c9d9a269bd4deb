//! Plugin contract.
//!
//! A plugin is a bundle of up to three optional providers:
//! - a UI provider ([`PluginUi`]) contributing a view to the shell,
//! - a command provider ([`PluginCommands`]) contributing a CLI subcommand,
//! - a migrations provider ([`PluginMigrations`]) owning extra tables.
//!
//! Plugins are registered through a compile-time table of
//! [`PluginDescriptor`]s (see `crate::plugins::builtin`). The loader in
//! [`registry`] resolves each descriptor's factories and isolates failures per
//! plugin.

use clap::{ArgMatches, Command};
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Rect};
use ratatui::Frame;
use rusqlite::Connection;

use crate::context::AppContext;
use crate::error::Result;
use crate::output::OutputOptions;

pub mod registry;

pub use registry::{
    find_descriptor, load_plugin_commands, load_plugin_uis, migrate_plugin, LoadReport,
    LoadedPlugin, PluginLoadFailure,
};

/// One entry in a plugin's keybinding help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    pub key: String,
    pub description: String,
}

impl KeyHint {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }
}

/// What a view did with a key it was offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    /// Not a key this view uses.
    Ignored,
    Handled,
    /// Handled, with a message for the status bar.
    Status(String),
}

/// A component mounted in the shell's plugin area.
pub trait PluginView {
    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool);

    fn handle_key(&mut self, _key: KeyEvent) -> ViewOutcome {
        ViewOutcome::Ignored
    }

    /// Vertical space requested when several views share the plugin area.
    fn constraint(&self) -> Constraint {
        Constraint::Min(0)
    }

    /// Whether tab-cycling can land on this view.
    fn focusable(&self) -> bool {
        true
    }

    /// True while the view is collecting text; the shell then forwards
    /// single-character global keys (`q`, `?`) to it instead.
    fn captures_input(&self) -> bool {
        false
    }
}

/// UI provider: how the shell lists a plugin and builds its view.
pub trait PluginUi {
    fn name(&self) -> &str;

    fn shortcut(&self) -> Option<char> {
        None
    }

    /// Build fresh view components. Called on every switch to this plugin.
    fn create_view(&self, ctx: &AppContext) -> Result<Vec<Box<dyn PluginView>>>;

    fn keybindings(&self) -> Vec<KeyHint> {
        Vec::new()
    }
}

/// Command provider: one top-level CLI subcommand.
pub trait PluginCommands {
    /// Subcommand definition; its name is the dispatch key.
    fn command(&self) -> Command;

    fn run(&self, ctx: &AppContext, matches: &ArgMatches, output: OutputOptions) -> Result<()>;
}

/// Create/drop hooks for plugin-owned tables.
pub trait PluginMigrations {
    fn create_tables(&self, conn: &Connection) -> Result<()>;
    fn drop_tables(&self, conn: &Connection) -> Result<()>;
}

pub type UiFactory = fn() -> Result<Box<dyn PluginUi>>;
pub type CommandsFactory = fn() -> Result<Box<dyn PluginCommands>>;
pub type MigrationsFactory = fn() -> Box<dyn PluginMigrations>;

/// Registration record for one plugin package.
#[derive(Clone, Copy)]
pub struct PluginDescriptor {
    /// Stable identifier; ids starting with `_` or `.` are never loaded.
    pub id: &'static str,
    pub ui: Option<UiFactory>,
    pub commands: Option<CommandsFactory>,
    pub migrations: Option<MigrationsFactory>,
}

impl PluginDescriptor {
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            ui: None,
            commands: None,
            migrations: None,
        }
    }

    pub const fn with_ui(mut self, factory: UiFactory) -> Self {
        self.ui = Some(factory);
        self
    }

    pub const fn with_commands(mut self, factory: CommandsFactory) -> Self {
        self.commands = Some(factory);
        self
    }

    pub const fn with_migrations(mut self, factory: MigrationsFactory) -> Self {
        self.migrations = Some(factory);
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.id.starts_with('_') || self.id.starts_with('.')
    }

    /// Short capability list, e.g. `["ui", "commands"]`.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut caps = Vec::new();
        if self.ui.is_some() {
            caps.push("ui");
        }
        if self.commands.is_some() {
            caps.push("commands");
        }
        if self.migrations.is_some() {
            caps.push("migrations");
        }
        caps
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
