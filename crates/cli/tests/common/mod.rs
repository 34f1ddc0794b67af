//! Shared test utilities for settings-cli integration tests.
//!
//! Responsibilities:
//! - Provide a hermetic CLI command factory.
//! - Write configuration documents into temporary directories.
//!
//! Invariants / Assumptions:
//! - All integration tests using this helper will be hermetic by default.
//! - `SETTINGS_*` variables from the host never reach the command.

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Returns a hermetic `settings-cli` command for integration testing.
///
/// It ensures:
/// - `SETTINGS_CONFIG` and `SETTINGS_KEY` are cleared to prevent host leakage.
/// - `RUST_LOG` is cleared so stderr only carries error messages.
pub fn settings_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("settings-cli");

    cmd.env_remove("SETTINGS_CONFIG")
        .env_remove("SETTINGS_KEY")
        .env_remove("RUST_LOG");

    cmd
}

/// Writes `contents` to `name` inside `dir` and returns the full path.
pub fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write test config");
    path
}

/// A two-environment YAML document used by multi mode tests.
#[allow(dead_code)]
pub const ENVIRONMENTS_YAML: &str = "\
dev:
  name: development
  value: 42
prod:
  name: production
  value: 100
";
