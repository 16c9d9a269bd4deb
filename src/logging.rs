//! Tracing subscriber setup.
//!
//! The filter comes from `RUST_LOG` (default `warn`). CLI commands log to
//! stderr; the interactive shell logs to `keeper.log` so output never lands on
//! the alternate screen.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "warn";
const MAX_FILTER_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

impl LogTarget {
    /// The shell owns the terminal; everything else may write to stderr.
    pub fn for_command(command: &str) -> Self {
        if command == "keeper" || command == "tui" {
            LogTarget::File
        } else {
            LogTarget::Stderr
        }
    }
}

pub fn init(target: LogTarget, log_path: Option<&Path>) {
    let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());

    let file = match (target, log_path) {
        (LogTarget::File, Some(path)) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            OpenOptions::new().create(true).append(true).open(path).ok()
        }
        _ => None,
    };

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });
    // Without a usable log file the shell stays silent rather than drawing over the UI.
    let stderr_layer = (target == LogTarget::Stderr).then(|| fmt::layer().with_writer(std::io::stderr));

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(filter)
        .try_init();
}

static PANIC_ECHO: AtomicBool = AtomicBool::new(true);

/// Record panics in the log, then hand them to the previous hook unless a
/// [`QuietPanics`] guard is alive.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_default();
        tracing::error!(%location, panic = %info, "panic");
        if panic_echo_enabled() {
            previous(info);
        }
    }));
}

pub fn panic_echo_enabled() -> bool {
    PANIC_ECHO.load(Ordering::SeqCst)
}

/// Keeps panic messages off stderr while alive. The shell holds one while it
/// owns the terminal, since stderr is then the raw-mode alternate screen.
pub struct QuietPanics {
    previous: bool,
}

impl QuietPanics {
    pub fn new() -> Self {
        Self {
            previous: PANIC_ECHO.swap(false, Ordering::SeqCst),
        }
    }
}

impl Default for QuietPanics {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        PANIC_ECHO.store(self.previous, Ordering::SeqCst);
    }
}

fn env_filter(raw: Option<&str>) -> EnvFilter {
    // Keep startup robust: ignore blank, huge or unparsable filters.
    raw.and_then(|raw| {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_FILTER_LEN {
            return None;
        }
        EnvFilter::try_new(raw).ok()
    })
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
