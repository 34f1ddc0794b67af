//! CLI exit codes for scripting and automation.
//!
//! Responsibilities:
//! - Define structured exit codes that scripts can use to distinguish error types.
//! - Map settings, override and source errors to exit codes.
//!
//! Does NOT handle:
//! - Error message formatting (handled by anyhow Display).
//!
//! Invariants:
//! - Exit codes 1-9 are reserved for specific error categories.
//! - Errors without a recognized cause anywhere in the chain map to 1.

use settings_manager::{OverrideError, SettingsError, SourceError};

/// Structured exit codes for settings-cli.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success - command completed successfully.
    Success = 0,

    /// General error - unhandled or generic failure.
    GeneralError = 1,

    /// Mode violation - an option or operation the current mode rejects.
    ///
    /// Scripts should add or drop `--multi`.
    ModeViolation = 2,

    /// Key not found - unknown active key or raw entry.
    NotFound = 4,

    /// Validation error - schema failure, bad override or ambiguous write.
    ///
    /// Scripts should fix the input and not retry.
    ValidationError = 5,

    /// Source error - a document could not be read or parsed.
    SourceError = 6,
}

impl ExitCode {
    /// Convert the exit code to an i32 for use with std::process::exit().
    pub const fn as_i32(self) -> i32 {
        self as u8 as i32
    }
}

impl From<&SettingsError> for ExitCode {
    fn from(err: &SettingsError) -> Self {
        match err {
            SettingsError::ModeViolation { .. } => ExitCode::ModeViolation,

            SettingsError::KeyNotFound(_)
            | SettingsError::UserConfigKeyNotFound(_)
            | SettingsError::ActiveKeyNotFound(_) => ExitCode::NotFound,

            SettingsError::AmbiguousWrite
            | SettingsError::InvalidOverride(_)
            | SettingsError::Validation { .. } => ExitCode::ValidationError,
        }
    }
}

impl From<&SourceError> for ExitCode {
    fn from(_: &SourceError) -> Self {
        ExitCode::SourceError
    }
}

impl From<&OverrideError> for ExitCode {
    fn from(_: &OverrideError) -> Self {
        ExitCode::ValidationError
    }
}

/// Extension trait for anyhow::Error to extract exit codes.
pub trait ExitCodeExt {
    /// Extract the appropriate exit code from this error.
    ///
    /// Returns ExitCode::GeneralError if no known error is in the chain.
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    fn exit_code(&self) -> ExitCode {
        for cause in self.chain() {
            if let Some(err) = cause.downcast_ref::<SettingsError>() {
                return ExitCode::from(err);
            }
            if let Some(err) = cause.downcast_ref::<SourceError>() {
                return ExitCode::from(err);
            }
            if let Some(err) = cause.downcast_ref::<OverrideError>() {
                return ExitCode::from(err);
            }
        }

        ExitCode::GeneralError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use settings_manager::{ConfigFormat, Mode};

    #[test]
    fn test_exit_code_as_i32() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::ModeViolation.as_i32(), 2);
        assert_eq!(ExitCode::NotFound.as_i32(), 4);
        assert_eq!(ExitCode::ValidationError.as_i32(), 5);
        assert_eq!(ExitCode::SourceError.as_i32(), 6);
    }

    #[test]
    fn test_from_settings_error_mode_violation() {
        let err = SettingsError::ModeViolation {
            operation: "set_active_key()",
            required: Mode::Multi,
        };
        assert_eq!(ExitCode::from(&err), ExitCode::ModeViolation);
    }

    #[test]
    fn test_from_settings_error_not_found() {
        for err in [
            SettingsError::KeyNotFound("prod".to_string()),
            SettingsError::UserConfigKeyNotFound("prod".to_string()),
            SettingsError::ActiveKeyNotFound("default".to_string()),
        ] {
            assert_eq!(ExitCode::from(&err), ExitCode::NotFound);
        }
    }

    #[test]
    fn test_from_settings_error_validation() {
        assert_eq!(
            ExitCode::from(&SettingsError::AmbiguousWrite),
            ExitCode::ValidationError
        );
        let err = SettingsError::Validation {
            key: "default".to_string(),
            source: "missing field".into(),
        };
        assert_eq!(ExitCode::from(&err), ExitCode::ValidationError);
    }

    #[test]
    fn test_exit_code_found_through_context() {
        let err = anyhow::Error::new(SettingsError::KeyNotFound("qa".to_string()))
            .context("Failed to select key");
        assert_eq!(err.exit_code(), ExitCode::NotFound);

        let source = SourceError::NotAMapping {
            format: ConfigFormat::Yaml,
        };
        let err = Err::<(), _>(source)
            .context("Failed to load configuration")
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::SourceError);
    }

    #[test]
    fn test_override_error_in_chain() {
        let err = anyhow::Error::new(OverrideError::EmptyPath).context("Invalid --set value");
        assert_eq!(err.exit_code(), ExitCode::ValidationError);
    }

    #[test]
    fn test_unknown_error_is_general() {
        let err = anyhow::anyhow!("Invalid output format: xml");
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
    }
}
