//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Read defaults for the config path and active key from the environment.
//!
//! Non-responsibilities:
//! - Does not execute commands (see `dispatch` module).
//! - Does not load or validate configuration documents.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "settings-cli")]
#[command(about = "Resolve layered settings from files, environment and overrides", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  settings-cli -c app.toml resolve\n  settings-cli -c app.toml -s database.port=6543 resolve\n  settings-cli -c app.toml --env-prefix APP resolve -o yaml\n  settings-cli --multi -c environments.yaml -k prod resolve\n  settings-cli --multi -c environments.yaml keys\n"
)]
pub struct Cli {
    /// Configuration document to load (JSON, YAML or TOML).
    ///
    /// Can also be set via SETTINGS_CONFIG environment variable.
    #[arg(short, long, global = true, env = "SETTINGS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat the document as a mapping of named configurations
    #[arg(long, global = true)]
    pub multi: bool,

    /// Active configuration key (multi mode)
    #[arg(short, long, global = true, env = "SETTINGS_KEY")]
    pub key: Option<String>,

    /// Override one value by dot-separated path (single mode, repeatable)
    #[arg(short, long = "set", global = true, value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Read overrides from PREFIX__FIELD__NESTED environment variables (single mode)
    #[arg(long, global = true, value_name = "PREFIX")]
    pub env_prefix: Option<String>,

    /// Document with default values merged beneath every entry
    #[arg(long, global = true, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Field that every resolved entry must define (dot-separated, repeatable)
    #[arg(long, global = true, value_name = "FIELD")]
    pub require: Vec<String>,

    /// Output format (json, yaml)
    #[arg(short, long, global = true, default_value = "json")]
    pub output: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the settings for the active key
    Resolve,

    /// List every key, marking the active one
    Keys,

    /// Print the raw user configuration stored under a key
    Raw {
        /// Key to look up ("default" in single mode)
        #[arg(id = "raw_key", value_name = "KEY")]
        key: String,
    },

    /// Print the resolved settings for every key
    All,
}
