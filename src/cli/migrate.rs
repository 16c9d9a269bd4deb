//! `keeper migrate <plugin> <action>`

use serde::Serialize;

use crate::context::AppContext;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::plugin::migrate_plugin;
use crate::plugins;

#[derive(Serialize)]
struct MigrateOutput {
    plugin: String,
    action: String,
}

pub fn run(ctx: &AppContext, output: OutputOptions, plugin: &str, action: &str) -> Result<()> {
    let action = migrate_plugin(ctx.db(), plugins::builtin(), plugin, action)?;

    let mut human = HumanOutput::new(format!("Migrations applied for {plugin}"));
    human.push_summary("Action", action.to_string());

    emit_success(
        output,
        "migrate",
        &MigrateOutput {
            plugin: plugin.to_string(),
            action: action.to_string(),
        },
        Some(&human),
    )
}
