//! Extra preprocessor definitions passed to the front end.

use crate::error::PipelineError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// `-D<name>=<value>` flags read from a JSON object of integers and strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraDefs {
    flags: Vec<String>,
}

impl ExtraDefs {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::io(path, source))?;
        let value: Value = serde_json::from_str(&text).map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, PipelineError> {
        let Value::Object(entries) = value else {
            return Err(PipelineError::InvalidDefinition {
                name: "<root>".into(),
                found: kind_of(value).into(),
            });
        };

        let flags = entries
            .iter()
            .map(|(name, value)| match value {
                Value::Number(number) if number.is_i64() || number.is_u64() => {
                    Ok(format!("-D{name}={number}"))
                }
                Value::String(text) => Ok(format!("-D{name}={text}")),
                other => Err(PipelineError::InvalidDefinition {
                    name: name.clone(),
                    found: kind_of(other).into(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { flags })
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a non-integer number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
