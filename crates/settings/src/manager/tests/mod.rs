//! Tests for the settings manager.
//!
//! Responsibilities:
//! - Test single mode writes, overrides and default construction.
//! - Test multi mode dispatch, active key handling and fallback.
//! - Test cache lifecycle: invalidation, all-or-nothing rebuilds, retries.
//!
//! Invariants:
//! - Fixtures mirror a typical schema with two defaulted fields.

use std::cell::Cell;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::ConfigMap;
use crate::factory::{FnFactory, SerdeFactory, SettingsFactory, factory_fn};


#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    pub name: String,
    pub value: i64,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            value: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("value must not be negative, got {0}")]
pub struct NegativeValue(pub i64);

pub fn serde_factory() -> SerdeFactory<TestSettings> {
    SerdeFactory::new()
}

/// Factory that rejects negative values and counts how often it runs.
pub fn counting_factory(
    calls: Rc<Cell<usize>>,
) -> FnFactory<impl Fn(&ConfigMap) -> Result<TestSettings, NegativeValue>> {
    factory_fn(move |config: &ConfigMap| {
        calls.set(calls.get() + 1);
        let settings = serde_factory()
            .build(config)
            .unwrap_or_else(|e| panic!("fixture config should deserialize: {e}"));
        if settings.value < 0 {
            return Err(NegativeValue(settings.value));
        }
        Ok(settings)
    })
}

pub fn map(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}
