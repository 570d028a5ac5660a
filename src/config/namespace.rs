//! Dotted-path projection over a merged configuration.
//!
//! Templates address settings as `paths.workdir` instead of spelling out
//! nested lookups. The projection owns a point-in-time clone of the source
//! document: later mutation of the source is deliberately not reflected.

use crate::error::Error;
use anyhow::Result;
use serde_yaml::{Mapping, Value};

use super::loader::get_key;

/// Read-only dotted-path view of a configuration document.
#[derive(Debug, Clone)]
pub struct ConfigNamespace {
    root: Mapping,
}

impl ConfigNamespace {
    pub fn new(doc: &Mapping) -> Self {
        Self { root: doc.clone() }
    }

    /// Resolve `a.b.c` to the value at `doc["a"]["b"]["c"]`, descending only
    /// through nested mappings.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut keys = path.split('.');
        let mut current = get_key(&self.root, keys.next()?)?;

        for key in keys {
            match current {
                Value::Mapping(section) => current = get_key(section, key)?,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Scalar rendering of the value at `path`, for interpolation. Mappings
    /// and sequences have no scalar form.
    pub fn scalar(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(text) => Some(text.clone()),
            Value::Bool(flag) => Some(flag.to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// The string at `path`, required.
    pub fn require_str(&self, path: &str) -> Result<String> {
        match self.get(path) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(_) => Err(Error::InvalidConfigSetting(format!(
                "setting '{path}' is not a string"
            ))
            .into()),
            None => {
                Err(Error::InvalidConfigSetting(format!("missing required setting '{path}'"))
                    .into())
            }
        }
    }

    /// The integer at `path`, required. A numeric-looking string is accepted
    /// through a strict literal parse that fails closed; nothing is ever
    /// evaluated as an expression.
    pub fn require_i64(&self, path: &str) -> Result<i64> {
        let value = self.get(path).ok_or_else(|| {
            Error::InvalidConfigSetting(format!("missing required setting '{path}'"))
        })?;

        match value {
            Value::Number(number) => number.as_i64().ok_or_else(|| {
                Error::InvalidConfigSetting(format!("setting '{path}' is not an integer")).into()
            }),
            Value::String(text) => text.trim().parse::<i64>().map_err(|_| {
                Error::InvalidConfigSetting(format!(
                    "setting '{path}' is not an integer literal: '{text}'"
                ))
                .into()
            }),
            _ => Err(Error::InvalidConfigSetting(format!(
                "setting '{path}' is not an integer"
            ))
            .into()),
        }
    }

    /// The boolean at `path`; absent means `false`.
    pub fn flag(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Bool(true)))
    }
}
