//! keeper - habit and task tracker CLI
//!
//! Without a subcommand keeper opens the interactive shell; plugin
//! subcommands such as `keeper tasks` work from scripts.

use keeper::logging::{self, LogTarget};
use keeper::output::{emit_error, infer_command_name_from_args};
use keeper::paths::AppPaths;

fn main() {
    let command = infer_command_name_from_args();
    let json = std::env::args().skip(1).any(|arg| arg == "--json");

    let paths = match AppPaths::resolve() {
        Ok(paths) => paths,
        Err(err) => {
            logging::init(LogTarget::Stderr, None);
            let _ = emit_error(&command, &err, json);
            std::process::exit(err.exit_code());
        }
    };

    let target = LogTarget::for_command(&command);
    logging::init(target, Some(&paths.log_path()));
    if target == LogTarget::File {
        logging::install_panic_hook();
    }

    if let Err(err) = keeper::cli::run(paths) {
        tracing::debug!(error = %err, "command failed");
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
