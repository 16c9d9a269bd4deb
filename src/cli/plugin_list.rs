//! `keeper plugins`

use serde::Serialize;

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::plugin::{load_plugin_commands, load_plugin_uis, PluginLoadFailure};
use crate::plugins;

#[derive(Serialize)]
struct PluginEntry {
    id: &'static str,
    capabilities: Vec<&'static str>,
    disabled: bool,
    ui_loaded: bool,
    commands_loaded: bool,
}

#[derive(Serialize)]
struct PluginsOutput {
    plugins: Vec<PluginEntry>,
    failures: Vec<PluginLoadFailure>,
}

pub fn run(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let config = &ctx.config().plugins;
    let uis = load_plugin_uis(plugins::builtin(), config);
    let commands = load_plugin_commands(plugins::builtin(), config);
    let ui_ids = uis.ids();
    let command_ids = commands.ids();

    let entries: Vec<PluginEntry> = plugins::builtin()
        .iter()
        .filter(|descriptor| !descriptor.is_hidden())
        .map(|descriptor| PluginEntry {
            id: descriptor.id,
            capabilities: descriptor.capabilities(),
            disabled: config.is_disabled(descriptor.id),
            ui_loaded: ui_ids.contains(&descriptor.id),
            commands_loaded: command_ids.contains(&descriptor.id),
        })
        .collect();
    let mut failures = uis.failures;
    failures.extend(commands.failures);

    let mut human = HumanOutput::new("Plugins");
    human.push_summary("Total", entries.len().to_string());
    for entry in &entries {
        let state = if entry.disabled { " (disabled)" } else { "" };
        human.push_detail(format!(
            "{} [{}]{state}",
            entry.id,
            entry.capabilities.join(", ")
        ));
    }
    for failure in &failures {
        human.push_warning(Error::from(failure.clone()).to_string());
    }

    emit_success(
        output,
        "plugins",
        &PluginsOutput {
            plugins: entries,
            failures,
        },
        Some(&human),
    )
}
