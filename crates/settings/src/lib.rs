//! Layered settings resolution.
//!
//! This crate merges user configuration and overrides into validated settings
//! instances, either for a single configuration or for several named
//! configurations with one of them active.

pub mod constants;
mod error;
mod factory;
mod manager;
pub mod merge;
pub mod overrides;
pub mod source;

/// Plain, unvalidated mapping from field name to value.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

pub use constants::DEFAULT_KEY;
pub use error::{BoxError, SettingsError};
pub use factory::{FnFactory, SerdeFactory, SettingsFactory, factory_fn};
pub use manager::{Mode, SettingsManager};
pub use merge::{deep_merge, merge_maps};
pub use overrides::{OverrideError, OverrideLayer};
pub use source::{ConfigFormat, SourceError, load_file};
