//! Output formatters for CLI commands.
//!
//! Responsibilities:
//! - Parse the `--output` format name.
//! - Render serializable command output as JSON or YAML.
//!
//! Does NOT handle:
//! - Direct printing to stdout (returns formatted strings).
//!
//! Invariants:
//! - JSON output is pretty-printed and ends without a trailing newline; the
//!   caller adds one.
//! - Empty key lists render as valid empty documents (`[]`).

use anyhow::{Context, Result};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse from string.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => anyhow::bail!("Invalid output format: {}. Valid options: json, yaml", s),
        }
    }
}

/// One row of the `keys` command.
#[derive(Debug, Clone, Serialize)]
pub struct KeyEntry {
    pub key: String,
    pub active: bool,
}

/// Render `value` in the requested format.
pub fn format_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
        }
        OutputFormat::Yaml => {
            let rendered =
                serde_yaml::to_string(value).context("Failed to serialize output as YAML")?;
            Ok(rendered.trim_end().to_string())
        }
    }
}
