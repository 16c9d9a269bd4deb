//! keeper - habit and task tracker library
//!
//! Everything keeper tracks is a *trackable* (a task, a habit, a metric) plus
//! an append-only log of *events* recorded against it. Plugins build on that
//! model: each contributes a view to the interactive shell, CLI subcommands,
//! and optionally tables of its own.
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `keeper.toml`
//! - `context`: Application context handed to plugins
//! - `db`: SQLite connection handling, core schema, plugin migrations
//! - `error`: Error types and result aliases
//! - `identity`: Local user identity
//! - `logging`: Tracing subscriber setup
//! - `output`: Human and JSON output for CLI commands
//! - `paths`: Application-data directory layout
//! - `plugin`: Plugin contract and loader
//! - `plugins`: Built-in plugins (tasks, calendar)
//! - `trackables`: Trackable API
//! - `ui`: Interactive shell and shared widgets

pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod identity;
pub mod logging;
pub mod output;
pub mod paths;
pub mod plugin;
pub mod plugins;
pub mod trackables;
pub mod ui;

pub use error::{Error, Result};
