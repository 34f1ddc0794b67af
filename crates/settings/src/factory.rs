//! Settings construction capability.
//!
//! Responsibilities:
//! - Define `SettingsFactory`, the boundary to whatever validates settings.
//! - Provide a serde-backed factory and a closure-backed factory.
//!
//! Does NOT handle:
//! - Merging layers before construction (see `manager` and `merge`).
//! - Tagging failures with their key (done by the manager).
//!
//! Invariants:
//! - A factory never mutates the mapping it is given.
//! - Building from an empty mapping yields the schema's all-defaults instance
//!   (or fails if the schema has required fields).

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ConfigMap;

/// Turns a flat configuration mapping into a validated settings instance.
pub trait SettingsFactory {
    /// The validated settings type.
    type Settings: Clone;
    /// Failure reported when the mapping does not satisfy the schema.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build settings from named field values.
    fn build(&self, config: &ConfigMap) -> Result<Self::Settings, Self::Error>;
}

impl<F: SettingsFactory + ?Sized> SettingsFactory for &F {
    type Settings = F::Settings;
    type Error = F::Error;

    fn build(&self, config: &ConfigMap) -> Result<Self::Settings, Self::Error> {
        (**self).build(config)
    }
}

/// Factory that deserializes settings with serde.
///
/// Field defaults come from the type itself, typically via
/// `#[serde(default)]`; unknown or mistyped fields fail the way serde fails.
pub struct SerdeFactory<T> {
    _settings: PhantomData<fn() -> T>,
}

impl<T> SerdeFactory<T> {
    pub fn new() -> Self {
        Self {
            _settings: PhantomData,
        }
    }
}

impl<T> Default for SerdeFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeFactory<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeFactory")
            .field("settings", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> SettingsFactory for SerdeFactory<T>
where
    T: DeserializeOwned + Clone,
{
    type Settings = T;
    type Error = serde_json::Error;

    fn build(&self, config: &ConfigMap) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(config.clone()))
    }
}

/// Factory backed by a closure.
#[derive(Clone)]
pub struct FnFactory<F> {
    build: F,
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`SettingsFactory`].
///
/// ```rust,ignore
/// let factory = factory_fn(|config: &ConfigMap| {
///     let port = config.get("port").and_then(Value::as_u64).unwrap_or(8080);
///     Ok::<_, std::io::Error>(port)
/// });
/// ```
pub fn factory_fn<S, E, F>(build: F) -> FnFactory<F>
where
    F: Fn(&ConfigMap) -> Result<S, E>,
    S: Clone,
    E: std::error::Error + Send + Sync + 'static,
{
    FnFactory { build }
}

impl<S, E, F> SettingsFactory for FnFactory<F>
where
    F: Fn(&ConfigMap) -> Result<S, E>,
    S: Clone,
    E: std::error::Error + Send + Sync + 'static,
{
    type Settings = S;
    type Error = E;

    fn build(&self, config: &ConfigMap) -> Result<S, E> {
        (self.build)(config)
    }
}
