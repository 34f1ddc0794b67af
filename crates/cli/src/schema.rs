//! Document schema used by the CLI.
//!
//! Responsibilities:
//! - Merge a defaults document beneath every resolved entry.
//! - Reject entries that leave a required field undefined.
//!
//! Does NOT handle:
//! - Typed validation; resolved settings stay as JSON values.

use serde_json::Value;
use settings_manager::constants::PATH_SEPARATOR;
use settings_manager::merge::merge_layers;
use settings_manager::{ConfigMap, SettingsFactory};

/// Errors raised while building a document from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required field '{field}'")]
    MissingField { field: String },
}

/// Settings factory producing plain documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentSchema {
    defaults: ConfigMap,
    required: Vec<String>,
}

impl DocumentSchema {
    pub fn new(defaults: ConfigMap, required: Vec<String>) -> Self {
        Self { defaults, required }
    }
}

impl SettingsFactory for DocumentSchema {
    type Settings = Value;
    type Error = SchemaError;

    fn build(&self, config: &ConfigMap) -> Result<Value, SchemaError> {
        let document = merge_layers([self.defaults.clone(), config.clone()]);

        if let Some(field) = self
            .required
            .iter()
            .find(|field| lookup(&document, field).is_none_or(Value::is_null))
        {
            return Err(SchemaError::MissingField {
                field: field.clone(),
            });
        }

        Ok(Value::Object(document))
    }
}

fn lookup<'a>(document: &'a ConfigMap, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(PATH_SEPARATOR);
    let first = document.get(segments.next()?)?;
    segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
}
