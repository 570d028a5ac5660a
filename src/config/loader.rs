//! YAML document loading and section descent.
//!
//! Documents are plain `serde_yaml::Mapping`s loaded verbatim; serde_yaml's
//! data-only model is the safe-parse mode, so no tag in a config file can
//! execute code. Section descent supports one or two keys with a single
//! case-insensitive fallback per key.

use crate::error::Error;
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Load a full YAML document as a mapping.
///
/// An empty file yields an empty mapping; a non-mapping top level is an
/// error, since every downstream consumer merges and descends by key.
pub fn load_document(path: &Path) -> Result<Mapping> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed reading config file: {}", path.display()))?;

    let raw: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid YAML syntax: {}", path.display()))?;

    match raw {
        Value::Mapping(doc) => Ok(doc),
        Value::Null => Ok(Mapping::new()),
        _ => anyhow::bail!("top level of {} is not a mapping", path.display()),
    }
}

/// Load a document and descend into `section_path`, key by key.
///
/// At most two keys are accepted: one file, one section descent, never more.
pub fn load_section(path: &Path, section_path: &[String]) -> Result<Mapping> {
    if section_path.len() > 2 {
        return Err(Error::InvalidConfigSetting(format!(
            "{} section keys were provided for {}; at most 2 allowed",
            section_path.len(),
            path.display()
        ))
        .into());
    }

    let mut doc = load_document(path)?;
    for key in section_path {
        doc = descend(&doc, key, path)?;
    }

    Ok(doc)
}

/// Return the value for `key` in `map`, trying the exact key first and then
/// one case-insensitive scan over the keys.
pub fn get_key<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    if let Some(found) = map.get(Value::String(key.to_string())) {
        return Some(found);
    }

    let folded = key.to_lowercase();
    map.iter().find_map(|(k, v)| match k {
        Value::String(name) if name.to_lowercase() == folded => Some(v),
        _ => None,
    })
}

fn descend(map: &Mapping, key: &str, path: &Path) -> Result<Mapping> {
    match get_key(map, key) {
        Some(Value::Mapping(section)) => Ok(section.clone()),
        Some(_) => anyhow::bail!("section '{}' of {} is not a mapping", key, path.display()),
        None => Err(Error::SectionNotFound {
            section: key.to_string(),
            path: path.to_path_buf(),
        }
        .into()),
    }
}
