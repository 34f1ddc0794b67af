//! Configuration sources: JSON, YAML and TOML documents.
//!
//! Responsibilities:
//! - Detect a document format from a file extension.
//! - Parse a document into a `ConfigMap` for `SettingsManager::set_user_config`.
//!
//! Does NOT handle:
//! - Deciding whether a document is bulk or single-entry (see `manager`).
//! - Watching files for changes or writing them back.
//!
//! Invariants:
//! - The top level of every document must be a mapping.
//! - TOML datetimes become strings; non-finite TOML floats become null.
//! - Errors carry the path but never the file contents.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::ConfigMap;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => f.write_str("JSON"),
            ConfigFormat::Yaml => f.write_str("YAML"),
            ConfigFormat::Toml => f.write_str("TOML"),
        }
    }
}

/// Errors that can occur while reading a configuration document.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read config file at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config file at {path}: {message}")]
    Parse {
        path: PathBuf,
        format: ConfigFormat,
        message: String,
    },

    #[error("Invalid {format} document: {message}")]
    InvalidDocument {
        format: ConfigFormat,
        message: String,
    },

    #[error("Unsupported config file extension at {path} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Top level of the {format} document must be a mapping")]
    NotAMapping { format: ConfigFormat },
}

/// Parse a document held in memory.
pub fn parse_str(format: ConfigFormat, contents: &str) -> Result<ConfigMap, SourceError> {
    let invalid = |message: String| SourceError::InvalidDocument { format, message };

    let value = match format {
        ConfigFormat::Json => {
            serde_json::from_str::<Value>(contents).map_err(|e| invalid(e.to_string()))?
        }
        ConfigFormat::Yaml => {
            // An empty YAML document is null; treat it as an empty mapping.
            if contents.trim().is_empty() {
                Value::Object(ConfigMap::new())
            } else {
                serde_yaml::from_str::<Value>(contents).map_err(|e| invalid(e.to_string()))?
            }
        }
        ConfigFormat::Toml => {
            let table = toml::from_str::<toml::Table>(contents).map_err(|e| invalid(e.to_string()))?;
            toml_to_json(toml::Value::Table(table))
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SourceError::NotAMapping { format }),
    }
}

/// Read and parse a document, detecting the format from its extension.
pub fn load_file(path: &Path) -> Result<ConfigMap, SourceError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| SourceError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    load_file_as(path, format)
}

/// Read and parse a document in an explicit format.
pub fn load_file_as(path: &Path, format: ConfigFormat) -> Result<ConfigMap, SourceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let map = parse_str(format, &contents).map_err(|err| match err {
        SourceError::InvalidDocument { format, message } => SourceError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        },
        other => other,
    })?;

    tracing::debug!(
        path = %path.display(),
        format = %format,
        keys = map.len(),
        "Loaded configuration document"
    );
    Ok(map)
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
