//! Recursive overlay merge with deletion-by-null semantics.
//!
//! The merge returns a new document rather than mutating the base in place,
//! so chained overlays have unambiguous ownership. Precedence always goes to
//! the updates document:
//!
//! - a null updates-value removes the key (no-op when absent);
//! - matching nested mappings merge recursively;
//! - anything else replaces outright, type changes included. Sequences are
//!   replaced, never merged elementwise.

use serde_yaml::{Mapping, Value};

/// Apply `updates` on top of `base` and return the merged document.
///
/// Unless `quiet`, every leaf-level set and remove prints one audit line
/// naming the fully-qualified dotted key path and the new value.
pub fn merge(base: &Mapping, updates: &Mapping, quiet: bool) -> Mapping {
    let mut merged = base.clone();
    apply(&mut merged, updates, quiet, &mut Vec::new());
    merged
}

/// Apply an optional overlay; absent or non-mapping overlays are a no-op.
pub fn merge_opt(base: &Mapping, updates: Option<&Value>, quiet: bool) -> Mapping {
    match updates {
        Some(Value::Mapping(overlay)) => merge(base, overlay, quiet),
        _ => base.clone(),
    }
}

fn apply(base: &mut Mapping, updates: &Mapping, quiet: bool, trail: &mut Vec<String>) {
    for (key, value) in updates {
        trail.push(key_name(key));

        match value {
            Value::Null => {
                // Remove the key entirely; absent keys are tolerated.
                if base.remove(key).is_some() && !quiet {
                    println!("unset {}", trail.join("."));
                }
            }
            Value::Mapping(overlay) => {
                if let Some(Value::Mapping(existing)) = base.get_mut(key) {
                    apply(existing, overlay, quiet, trail);
                } else {
                    base.insert(key.clone(), value.clone());
                    if !quiet {
                        println!("set {} = {}", trail.join("."), display_value(value));
                    }
                }
            }
            other => {
                base.insert(key.clone(), other.clone());
                if !quiet {
                    println!("set {} = {}", trail.join("."), display_value(other));
                }
            }
        }

        trail.pop();
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(name) => name.clone(),
        other => display_value(other),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim_end().replace('\n', "; "))
            .unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).expect("yaml")
    }

    #[test]
    fn updates_take_precedence() {
        let merged = merge(&doc("a: 1\nb: 2\n"), &doc("b: 3\n"), true);
        assert_eq!(merged, doc("a: 1\nb: 3\n"));
    }

    #[test]
    fn null_removes_key() {
        let merged = merge(&doc("a: 1\nb: 2\n"), &doc("b: null\n"), true);
        assert_eq!(merged, doc("a: 1\n"));
    }

    #[test]
    fn null_for_absent_key_is_tolerated() {
        let merged = merge(&doc("a: 1\n"), &doc("missing: null\n"), true);
        assert_eq!(merged, doc("a: 1\n"));
    }

    #[test]
    fn nested_mappings_recurse_and_preserve_siblings() {
        let base = doc("grid:\n  layout_x: 4\n  layout_y: 6\n");
        let merged = merge(&base, &doc("grid:\n  layout_x: 8\n"), true);
        assert_eq!(merged, doc("grid:\n  layout_x: 8\n  layout_y: 6\n"));
    }

    #[test]
    fn type_change_replaces_wholesale() {
        let base = doc("grid:\n  layout_x: 4\n");
        let merged = merge(&base, &doc("grid: conus\n"), true);
        assert_eq!(merged, doc("grid: conus\n"));

        let back = merge(&merged, &doc("grid:\n  layout_x: 2\n"), true);
        assert_eq!(back, doc("grid:\n  layout_x: 2\n"));
    }

    #[test]
    fn sequences_replace_rather_than_concatenate() {
        let merged = merge(&doc("files: [a, b]\n"), &doc("files: [c]\n"), true);
        assert_eq!(merged, doc("files: [c]\n"));
    }

    #[test]
    fn merge_is_idempotent() {
        let base = doc("a: 1\ngrid:\n  layout_x: 4\n  old: drop\n");
        let updates = doc("b: 2\ngrid:\n  layout_x: 8\n  old: null\n");
        let once = merge(&base, &updates, true);
        let twice = merge(&once, &updates, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_documents_are_no_ops() {
        let base = doc("a: 1\n");
        assert_eq!(merge(&base, &Mapping::new(), true), base);
        assert_eq!(merge(&Mapping::new(), &base, true), base);
    }

    #[test]
    fn merge_opt_ignores_non_mapping_overlay() {
        let base = doc("a: 1\n");
        assert_eq!(merge_opt(&base, None, true), base);
        assert_eq!(merge_opt(&base, Some(&Value::from("scalar")), true), base);
    }
}
