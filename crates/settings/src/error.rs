//! Error types for settings resolution.
//!
//! Responsibilities:
//! - Define the failure surface of every `SettingsManager` operation.
//! - Carry schema construction failures unmodified, tagged with their key.
//!
//! Does NOT handle:
//! - File loading errors (see `source::SourceError`).
//! - Details of override path errors (see `overrides::OverrideError`, wrapped
//!   here when they come from a manager call).
//!
//! Invariants:
//! - Errors are returned to the caller of the triggering operation; the
//!   manager never logs or swallows them.
//! - `Validation::source` is the factory's own error, downcastable by callers.

use thiserror::Error;

use crate::manager::Mode;
use crate::overrides::OverrideError;

/// Boxed error produced by a settings factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while writing or resolving settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The operation is not available in the manager's mode.
    #[error("{operation} is only available in {required} mode")]
    ModeViolation {
        operation: &'static str,
        required: Mode,
    },

    /// The key is absent from the resolved settings map.
    #[error("Key '{0}' does not exist in settings map")]
    KeyNotFound(String),

    /// The key was never written to the user configuration.
    #[error("Key '{0}' does not exist in user configuration")]
    UserConfigKeyNotFound(String),

    /// The active key could not be resolved (multi mode with no entries).
    #[error("Active key '{0}' does not exist in settings map")]
    ActiveKeyNotFound(String),

    /// A multi mode single-entry write arrived before any key was chosen.
    #[error(
        "In multi mode, either use a bulk configuration ({{\"dev\": {{...}}, \"prod\": {{...}}}}) or set an active key before writing an individual configuration"
    )]
    AmbiguousWrite,

    #[error("Invalid override: {0}")]
    InvalidOverride(#[from] OverrideError),

    /// The settings factory rejected the configuration for `key`.
    #[error("Settings for key '{key}' failed validation: {source}")]
    Validation {
        key: String,
        #[source]
        source: BoxError,
    },
}

impl SettingsError {
    /// Returns true for any of the key-not-found variants.
    pub fn is_key_not_found(&self) -> bool {
        matches!(
            self,
            SettingsError::KeyNotFound(_)
                | SettingsError::UserConfigKeyNotFound(_)
                | SettingsError::ActiveKeyNotFound(_)
        )
    }

    /// The factory error behind a `Validation` failure, if any.
    pub fn validation_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            SettingsError::Validation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn mode_violation(operation: &'static str, required: Mode) -> Self {
        SettingsError::ModeViolation {
            operation,
            required,
        }
    }
}
