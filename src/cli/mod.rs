//! Command-line interface for keeper
//!
//! Core commands are defined with clap derive. Plugin command providers
//! contribute further top-level subcommands at runtime; those are matched by
//! name and handed to the owning provider.

use std::collections::HashSet;
use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::output::OutputOptions;
use crate::paths::AppPaths;
use crate::plugin::{load_plugin_commands, load_plugin_uis, LoadedPlugin, PluginCommands};
use crate::plugins;
use crate::ui;

mod config;
mod migrate;
mod plugin_list;
mod whoami;

/// keeper - habit and task tracker
///
/// Runs the interactive shell when called without a subcommand.
#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Core subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive shell (the default)
    Tui,

    /// List plugins and what they provide
    Plugins,

    /// Show the local identity
    Whoami,

    /// Create or drop a plugin's tables
    Migrate {
        /// Plugin id (see `keeper plugins`)
        plugin: String,

        /// Migration action: create or drop
        action: String,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default keeper.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Entry point used by the binary.
pub fn run(paths: AppPaths) -> Result<()> {
    run_from(paths, std::env::args_os())
}

pub fn run_from<I, T>(paths: AppPaths, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let ctx = AppContext::init(paths)?;
    let report = load_plugin_commands(plugins::builtin(), &ctx.config().plugins);
    let providers = report.into_loaded()?;

    let (command, providers) = build_command(providers);
    let matches = command.get_matches_from(args);
    let output = OutputOptions {
        json: global_flag(&matches, "json"),
        quiet: global_flag(&matches, "quiet"),
    };

    if let Some((name, sub_matches)) = matches.subcommand() {
        if let Some(plugin) = providers
            .iter()
            .find(|plugin| plugin.provider.command().get_name() == name)
        {
            tracing::debug!(plugin = plugin.id, command = name, "dispatching plugin command");
            return plugin.provider.run(&ctx, sub_matches, output);
        }
    }

    let cli = Cli::from_arg_matches(&matches).map_err(|err| Error::InvalidArgument(err.to_string()))?;
    cli.run(ctx, output)
}

/// Core command tree plus one subcommand per provider. Providers whose
/// command name collides with a core command or an earlier plugin are dropped.
fn build_command(
    providers: Vec<LoadedPlugin<dyn PluginCommands>>,
) -> (clap::Command, Vec<LoadedPlugin<dyn PluginCommands>>) {
    let mut command = Cli::command();
    let mut taken: HashSet<String> = command
        .get_subcommands()
        .map(|sub| sub.get_name().to_string())
        .collect();
    taken.insert("help".to_string());

    let mut kept = Vec::new();
    for plugin in providers {
        let sub = plugin.provider.command();
        let name = sub.get_name().to_string();
        if !taken.insert(name.clone()) {
            tracing::warn!(plugin = plugin.id, command = %name, "command name already taken; skipping");
            continue;
        }
        command = command.subcommand(sub);
        kept.push(plugin);
    }
    (command, kept)
}

/// A global flag set at any level of the parsed command.
fn global_flag(matches: &ArgMatches, id: &str) -> bool {
    let here = matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false);
    here || matches
        .subcommand()
        .is_some_and(|(_, sub)| global_flag(sub, id))
}

impl Cli {
    pub fn run(self, ctx: AppContext, output: OutputOptions) -> Result<()> {
        match self.command {
            None | Some(Commands::Tui) => {
                let report = load_plugin_uis(plugins::builtin(), &ctx.config().plugins);
                let loaded = report.into_loaded()?;
                ui::run(ctx, loaded)
            }
            Some(Commands::Plugins) => plugin_list::run(&ctx, output),
            Some(Commands::Whoami) => whoami::run(&ctx, output),
            Some(Commands::Migrate { plugin, action }) => {
                migrate::run(&ctx, output, &plugin, &action)
            }
            Some(Commands::Config(cmd)) => match cmd {
                ConfigCommands::Show => config::run_show(&ctx, output),
                ConfigCommands::Init { force } => config::run_init(&ctx, output, force),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plugin_commands_join_the_tree() {
        let providers = load_plugin_commands(plugins::builtin(), &Default::default())
            .into_loaded()
            .unwrap();
        let (command, kept) = build_command(providers);
        command.clone().debug_assert();
        assert_eq!(kept.len(), 2);

        let matches = command
            .try_get_matches_from(["keeper", "tasks", "add", "Read", "--json", "--points", "2"])
            .unwrap();
        assert!(global_flag(&matches, "json"));
        assert!(!global_flag(&matches, "quiet"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "tasks");
        assert_eq!(sub.subcommand_name(), Some("add"));
    }

    #[test]
    fn no_subcommand_parses_to_shell() {
        let cli = Cli::try_parse_from(["keeper"]).unwrap();
        assert!(cli.command.is_none());
    }
}
