//! Settings CLI - resolve layered settings from the command line.
//!
//! Responsibilities:
//! - Parse command-line arguments and `SETTINGS_*` environment variables.
//! - Build a settings manager from documents, environment and assignments.
//! - Print resolved settings as JSON or YAML.
//!
//! Does NOT handle:
//! - Resolution, caching or key selection (see `settings-manager`).
//! - Writing configuration back to disk.
//!
//! Invariants:
//! - Logging goes to stderr; stdout carries only command output.
//! - Every failure maps to a structured exit code (see `error`).

mod args;
mod dispatch;
mod error;
mod formatters;
mod schema;

use args::Cli;
use clap::Parser;
use dispatch::run_command;
use error::{ExitCode, ExitCodeExt};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match run_command(cli) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("{:#}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code.as_i32());
}
