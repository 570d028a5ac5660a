//! Fortran namelist reading and writing.
//!
//! Groups map to nested mappings (`&group` … `/`), entries to `key = value`
//! lines. The reader covers the subset model namelists actually use: quoted
//! strings, `.true.`/`.false.`, integers, floats, and flat comma-separated
//! arrays. The writer is deterministic: groups and keys emit in document
//! order, so identical inputs produce byte-identical namelists.

use crate::error::Error;
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Parse a namelist file into a group → settings mapping.
pub fn read_namelist(path: &Path) -> Result<Mapping> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()).into());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed reading namelist: {}", path.display()))?;

    let mut groups = Mapping::new();
    let mut current: Option<(String, Mapping)> = None;

    for raw_line in contents.lines() {
        let line = strip_comment(raw_line).trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(group_name) = line.strip_prefix('&') {
            if let Some((name, settings)) = current.take() {
                groups.insert(Value::from(name), Value::Mapping(settings));
            }
            current = Some((group_name.trim().to_string(), Mapping::new()));
            continue;
        }

        if line == "/" {
            if let Some((name, settings)) = current.take() {
                groups.insert(Value::from(name), Value::Mapping(settings));
            }
            continue;
        }

        let Some((key, rhs)) = line.split_once('=') else {
            anyhow::bail!("malformed namelist line in {}: '{raw_line}'", path.display());
        };
        let Some((_, settings)) = current.as_mut() else {
            anyhow::bail!("namelist entry outside any group in {}: '{raw_line}'", path.display());
        };

        settings.insert(Value::from(key.trim()), parse_value(rhs.trim()));
    }

    if let Some((name, settings)) = current.take() {
        groups.insert(Value::from(name), Value::Mapping(settings));
    }

    Ok(groups)
}

/// Write a group → settings mapping as a namelist.
pub fn write_namelist(path: &Path, groups: &Mapping) -> Result<()> {
    let mut out = String::new();

    for (group, settings) in groups {
        let name = group.as_str().unwrap_or_default();
        let Value::Mapping(settings) = settings else {
            return Err(Error::InvalidConfigSetting(format!(
                "namelist group '{name}' is not a mapping"
            ))
            .into());
        };

        out.push_str(&format!("&{name}\n"));
        for (key, value) in settings {
            let key = key.as_str().unwrap_or_default();
            out.push_str(&format!("    {key} = {}\n", format_value(value)));
        }
        out.push_str("/\n\n");
    }

    fs::write(path, out).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    let mut in_quote: Option<char> = None;

    for (index, ch) in line.char_indices() {
        match in_quote {
            Some(quote) if ch == quote => in_quote = None,
            None => match ch {
                '\'' | '"' => in_quote = Some(ch),
                '!' => return &line[..index],
                _ => {}
            },
            _ => {}
        }
    }

    line
}

fn parse_value(text: &str) -> Value {
    // Flat arrays only; namelist multidimensional syntax is out of scope.
    if text.contains(',') {
        let items: Vec<Value> =
            text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(parse_scalar).collect();
        return Value::Sequence(items);
    }

    parse_scalar(text)
}

fn parse_scalar(text: &str) -> Value {
    match text.to_lowercase().as_str() {
        ".true." | ".t." => return Value::Bool(true),
        ".false." | ".f." => return Value::Bool(false),
        _ => {}
    }

    if (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
        || (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
    {
        return Value::from(&text[1..text.len() - 1]);
    }

    if let Ok(integer) = text.parse::<i64>() {
        return Value::from(integer);
    }
    if let Ok(real) = text.parse::<f64>() {
        return Value::from(real);
    }

    Value::from(text)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => ".true.".to_string(),
        Value::Bool(false) => ".false.".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => format!("'{}'", text.replace('\'', "''")),
        Value::Sequence(items) => {
            items.iter().map(format_value).collect::<Vec<_>>().join(", ")
        }
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim_end().to_string())
            .unwrap_or_default(),
    }
}
