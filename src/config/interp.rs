//! `{dotted.path}` placeholder substitution for path and command templates.
//!
//! Placeholders resolve against extra bindings first (`{cycle}` and friends),
//! then against the configuration namespace. A placeholder with no binding is
//! an error: templates are never rendered with silent blanks, and no fallback
//! evaluation of any kind is attempted.

use crate::config::ConfigNamespace;
use crate::error::Error;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\}").unwrap());

/// Substitute every `{name}` placeholder in `template`.
pub fn interpolate(
    template: &str,
    ns: &ConfigNamespace,
    extra: &[(&str, String)],
) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut cursor = 0;

    for found in PLACEHOLDER.captures_iter(template) {
        let whole = found.get(0).expect("capture 0");
        let name = &found[1];

        let value = extra
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, bound)| bound.clone())
            .or_else(|| ns.scalar(name))
            .ok_or_else(|| Error::UnboundVariable { name: name.to_string() })?;

        rendered.push_str(&template[cursor..whole.start()]);
        rendered.push_str(&value);
        cursor = whole.end();
    }

    rendered.push_str(&template[cursor..]);
    Ok(rendered)
}
