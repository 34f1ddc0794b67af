//! Override layer for single mode settings.
//!
//! Responsibilities:
//! - Hold the nested mapping that takes precedence over the user configuration.
//! - Edit that mapping by dot-separated path (`database.pool.max`).
//! - Parse `path=value` assignments and prefixed environment variables.
//!
//! Does NOT handle:
//! - Merging the layer onto user configuration (see `merge`).
//! - Cache invalidation (the manager wraps every edit).
//!
//! Invariants:
//! - Paths are non-empty and contain no empty segments.
//! - Setting a path below a scalar replaces the scalar with an object.
//! - Removing the last key of a nested object prunes the object.
//! - Assignment values are parsed as JSON when possible, otherwise kept as strings.

use serde_json::Value;
use thiserror::Error;

use crate::ConfigMap;
use crate::constants::{ASSIGNMENT_SEPARATOR, ENV_NESTED_DELIMITER, PATH_SEPARATOR};

/// Errors produced while building an override layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("Override path must not be empty")]
    EmptyPath,

    #[error("Override path '{path}' contains an empty segment")]
    EmptySegment { path: String },

    #[error("Override '{assignment}' must have the form PATH=VALUE")]
    MissingSeparator { assignment: String },
}

/// Nested mapping of values with the highest precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideLayer {
    values: ConfigMap,
}

impl OverrideLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already nested mapping as the layer.
    pub fn from_map(values: ConfigMap) -> Self {
        Self { values }
    }

    /// Build a layer from `path=value` assignments, later ones winning.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, OverrideError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut layer = Self::new();
        for assignment in assignments {
            layer.apply_assignment(assignment.as_ref())?;
        }
        Ok(layer)
    }

    /// Build a layer from `PREFIX__A__B=value` variables.
    ///
    /// The prefix matches ASCII case-insensitively and segments are
    /// lower-cased, so `app__Database__HOST` sets `database.host` for prefix
    /// `APP`. Variables without the prefix are ignored, as are empty or
    /// whitespace-only values. Names with an empty path or segment
    /// (`APP__`, `APP__A____B`) are skipped.
    pub fn from_env_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}{ENV_NESTED_DELIMITER}");
        let mut layer = Self::new();

        for (name, raw) in vars {
            let Some((head, rest)) = name.split_at_checked(marker.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(&marker) {
                continue;
            }
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let segments: Vec<String> = rest
                .split(ENV_NESTED_DELIMITER)
                .map(|segment| segment.trim().to_lowercase())
                .collect();
            if segments.iter().any(String::is_empty) {
                tracing::debug!(variable = %name, "Skipping environment override with an empty path segment");
                continue;
            }

            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
            tracing::trace!(variable = %name, "Applying environment override");
            insert_path(&mut layer.values, &segments, parse_value(raw));
        }

        layer
    }

    /// Build a layer from the process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are ignored.
    pub fn from_env(prefix: &str) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)));
        Self::from_env_vars(prefix, vars)
    }

    /// Set the value at `path`, creating intermediate objects.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), OverrideError> {
        let segments = split_path(path)?;
        insert_path(&mut self.values, &segments, value);
        Ok(())
    }

    /// Apply one `path=value` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), OverrideError> {
        let (path, value) = parse_assignment(assignment)?;
        self.set(&path, value)
    }

    /// Value at `path`, if present.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path).ok()?;
        let (first, rest) = segments.split_first()?;
        rest.iter()
            .try_fold(self.values.get(*first)?, |current, segment| {
                current.get(*segment)
            })
    }

    /// Remove the value at `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments = split_path(path).ok()?;
        remove_path(&mut self.values, &segments)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The nested mapping, as merged onto user configuration.
    pub fn as_map(&self) -> &ConfigMap {
        &self.values
    }

    pub fn into_map(self) -> ConfigMap {
        self.values
    }
}

impl From<ConfigMap> for OverrideLayer {
    fn from(values: ConfigMap) -> Self {
        Self::from_map(values)
    }
}

/// Split `path=value` into its path and parsed value.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value), OverrideError> {
    let (path, raw) = assignment
        .split_once(ASSIGNMENT_SEPARATOR)
        .ok_or_else(|| OverrideError::MissingSeparator {
            assignment: assignment.to_string(),
        })?;

    split_path(path)?;
    Ok((path.trim().to_string(), parse_value(raw)))
}

/// Interpret a raw override value: JSON if it parses, otherwise a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn split_path(path: &str) -> Result<Vec<&str>, OverrideError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(OverrideError::EmptyPath);
    }

    let segments: Vec<&str> = trimmed.split(PATH_SEPARATOR).map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(OverrideError::EmptySegment {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

fn insert_path(map: &mut ConfigMap, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(ConfigMap::new()));
            match child {
                Value::Object(child_map) => insert_path(child_map, rest, value),
                scalar => {
                    let mut child_map = ConfigMap::new();
                    insert_path(&mut child_map, rest, value);
                    *scalar = Value::Object(child_map);
                }
            }
        }
    }
}

fn remove_path(map: &mut ConfigMap, segments: &[&str]) -> Option<Value> {
    match segments {
        [] => None,
        [last] => map.remove(*last),
        [head, rest @ ..] => {
            let Value::Object(child) = map.get_mut(*head)? else {
                return None;
            };
            let removed = remove_path(child, rest);
            if removed.is_some() && child.is_empty() {
                map.remove(*head);
            }
            removed
        }
    }
}
