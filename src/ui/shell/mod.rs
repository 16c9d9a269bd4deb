//! Interactive shell: plugin selector, active plugin views, status bar.

pub mod app;
pub mod view;

pub use app::{run, Focus, ShellState, StatusKind};
