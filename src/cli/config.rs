//! `keeper config show|init`

use serde::Serialize;

use crate::config::Config;
use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(Serialize)]
struct ShowOutput<'a> {
    path: String,
    exists: bool,
    config: &'a Config,
}

pub fn run_show(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let path = ctx.paths().config_path();
    let exists = path.exists();
    let config = ctx.config();

    let mut human = HumanOutput::new("Configuration");
    human.push_summary("Path", path.display().to_string());
    human.push_summary("File", if exists { "present" } else { "missing (defaults)" });
    if exists {
        if let Err(err) = Config::load(&path) {
            human.push_warning(format!("file ignored: {err}"));
        }
    }
    for line in toml::to_string_pretty(config)?.lines() {
        human.push_detail(line.to_string());
    }

    emit_success(
        output,
        "config show",
        &ShowOutput {
            path: path.display().to_string(),
            exists,
            config,
        },
        Some(&human),
    )
}

#[derive(Serialize)]
struct InitOutput {
    path: String,
    overwritten: bool,
}

pub fn run_init(ctx: &AppContext, output: OutputOptions, force: bool) -> Result<()> {
    let path = ctx.paths().config_path();
    let exists = path.exists();
    if exists && !force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save(&path)?;
    tracing::info!(path = %path.display(), "wrote default configuration");

    let mut human = HumanOutput::new("Configuration written");
    human.push_summary("Path", path.display().to_string());
    human.push_next_step("keeper config show");

    emit_success(
        output,
        "config init",
        &InitOutput {
            path: path.display().to_string(),
            overwritten: exists,
        },
        Some(&human),
    )
}
