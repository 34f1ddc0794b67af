//! Centralized constants for the settings manager.
//!
//! This module contains the sentinel key and the path delimiters shared by
//! the manager, the override layer and the environment reader.

// =============================================================================
// Keys
// =============================================================================

/// Implicit key used for the only entry in single mode.
///
/// Also the initial active key in multi mode; a single-entry write is
/// rejected while the active key still equals this value and the store is
/// empty.
pub const DEFAULT_KEY: &str = "default";

// =============================================================================
// Override Paths
// =============================================================================

/// Separator between segments of an override path (`database.port`).
pub const PATH_SEPARATOR: char = '.';

/// Separator between a path and its value in an override assignment.
pub const ASSIGNMENT_SEPARATOR: char = '=';

/// Delimiter between nested segments in environment variable names
/// (`APP__DATABASE__PORT`).
pub const ENV_NESTED_DELIMITER: &str = "__";
