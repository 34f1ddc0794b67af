//! Command dispatch logic.
//!
//! Responsibilities:
//! - Assemble a settings manager from the parsed CLI options.
//! - Route subcommands to manager reads and print their output.
//!
//! Does NOT handle:
//! - CLI structure definitions (see `args` module).
//! - Exit code mapping (see `error` module).
//!
//! Invariants:
//! - Layers apply in order: defaults, document, environment, `--set`.
//! - Overrides are only installed when at least one was given, so multi
//!   mode rejects `--set` and `--env-prefix` instead of ignoring them.

use anyhow::{Context, Result};
use serde_json::Value;
use settings_manager::{ConfigMap, Mode, OverrideLayer, SettingsManager, load_file};

use crate::args::{Cli, Commands};
use crate::formatters::{KeyEntry, OutputFormat, format_output};
use crate::schema::DocumentSchema;

type Manager = SettingsManager<DocumentSchema>;

/// Build the manager described by `cli` and run its subcommand.
pub(crate) fn run_command(cli: Cli) -> Result<()> {
    let format = OutputFormat::from_str(&cli.output)?;
    let mut manager = build_manager(&cli)?;

    let output = match &cli.command {
        Commands::Resolve => {
            let settings = manager.current_settings()?;
            format_output(settings, format)?
        }
        Commands::Keys => {
            let keys = manager.all_keys()?;
            let active = manager.active_key();
            let entries: Vec<KeyEntry> = keys
                .into_iter()
                .map(|key| KeyEntry {
                    active: key == active,
                    key,
                })
                .collect();
            format_output(&entries, format)?
        }
        Commands::Raw { key } => {
            let raw = manager.raw_config_by_key(key)?;
            format_output(&Value::Object(raw), format)?
        }
        Commands::All => {
            let all = manager.all_settings()?;
            format_output(&all, format)?
        }
    };

    println!("{}", output);
    Ok(())
}

fn build_manager(cli: &Cli) -> Result<Manager> {
    let defaults = match &cli.defaults {
        Some(path) => load_file(path)
            .with_context(|| format!("Failed to load defaults from {}", path.display()))?,
        None => ConfigMap::new(),
    };
    let schema = DocumentSchema::new(defaults, cli.require.clone());

    let mode = if cli.multi { Mode::Multi } else { Mode::Single };
    let mut manager = SettingsManager::with_mode(schema, mode);
    tracing::debug!(mode = %mode, "Building settings manager");

    // Blank paths are ignored so an empty SETTINGS_CONFIG means "no document".
    if let Some(path) = cli
        .config
        .as_ref()
        .filter(|path| !path.to_string_lossy().trim().is_empty())
    {
        let config = load_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        manager.set_user_config(config)?;
    }

    if let Some(layer) = override_layer(cli)? {
        manager.set_overrides(layer)?;
    }

    if let Some(key) = &cli.key {
        manager
            .set_active_key(key)
            .with_context(|| format!("Failed to select configuration '{}'", key))?;
    }

    Ok(manager)
}

fn override_layer(cli: &Cli) -> Result<Option<OverrideLayer>> {
    if cli.env_prefix.is_none() && cli.set.is_empty() {
        return Ok(None);
    }

    let mut layer = match &cli.env_prefix {
        Some(prefix) => OverrideLayer::from_env(prefix),
        None => OverrideLayer::new(),
    };
    for assignment in &cli.set {
        layer
            .apply_assignment(assignment)
            .with_context(|| format!("Invalid --set value '{}'", assignment))?;
    }

    tracing::debug!(
        env_prefix = ?cli.env_prefix,
        assignments = cli.set.len(),
        "Collected overrides"
    );
    Ok(Some(layer))
}
