//! `model_config` control-file generation.
//!
//! The merged configuration's `model_config` list drives the file: a mapping
//! item `{key: scope}` copies `key` from the named document (`config`,
//! `grid`, `machine`, `nml`), falling back to the literal value on a miss;
//! a string item names a generator in a fixed registry. Unknown generator
//! names fail validation up front rather than being skipped.

use super::RunContext;
use crate::config::{get_key, ConfigNamespace};
use crate::error::Error;
use crate::render::write_yaml;
use anyhow::Result;
use serde_yaml::{Mapping, Value};

const GENERATORS: [&str; 3] = ["pe_member01", "quilting", "start_times"];

/// Check the item list shape and every generator name, without side effects.
pub fn validate_items(config: &Mapping) -> Result<()> {
    for item in items(config) {
        match item {
            Value::String(name) if !GENERATORS.contains(&name.as_str()) => {
                return Err(Error::InvalidConfigSetting(format!(
                    "'{name}' is not a known model_config generator"
                ))
                .into());
            }
            Value::String(_) | Value::Mapping(_) => {}
            _ => {
                return Err(Error::InvalidConfigSetting(
                    "model_config items must be key/scope mappings or generator names"
                        .to_string(),
                )
                .into());
            }
        }
    }

    Ok(())
}

/// Build and write `<workdir>/model_config`.
pub fn create_model_config(ctx: &mut RunContext) -> Result<()> {
    let item_list: Vec<Value> = items(&ctx.config).to_vec();
    let mut out = Mapping::new();

    for item in &item_list {
        match item {
            Value::Mapping(pairs) => {
                for (key, scope) in pairs {
                    let name = key.as_str().ok_or_else(|| {
                        Error::InvalidConfigSetting(
                            "model_config keys must be strings".to_string(),
                        )
                    })?;
                    out.insert(key.clone(), resolve_scoped(ctx, name, scope));
                }
            }
            Value::String(name) => {
                for (key, value) in run_generator(ctx, name)? {
                    out.insert(key, value);
                }
            }
            _ => {
                return Err(Error::InvalidConfigSetting(
                    "model_config items must be key/scope mappings or generator names"
                        .to_string(),
                )
                .into());
            }
        }
    }

    write_yaml(&ctx.workdir.join("model_config"), &out)
}

fn items(config: &Mapping) -> &[Value] {
    match get_key(config, "model_config") {
        Some(Value::Sequence(list)) => list,
        _ => &[],
    }
}

/// Look `key` up in the document named by `scope`; a miss falls back to the
/// literal scope value. Booleans render Fortran-style.
fn resolve_scoped(ctx: &RunContext, key: &str, scope: &Value) -> Value {
    let looked_up = scope.as_str().and_then(|scope_name| {
        let doc = match scope_name {
            "config" => Some(&ctx.config),
            "grid" => Some(&ctx.grid),
            "machine" => Some(&ctx.machine),
            "nml" => Some(&ctx.nml),
            _ => None,
        }?;
        get_key(doc, key).cloned()
    });

    fortranize(looked_up.unwrap_or_else(|| scope.clone()))
}

fn fortranize(value: Value) -> Value {
    match value {
        Value::Bool(true) => Value::from(".true."),
        Value::Bool(false) => Value::from(".false."),
        other => other,
    }
}

fn run_generator(ctx: &mut RunContext, name: &str) -> Result<Mapping> {
    match name {
        "pe_member01" => pe_member01(ctx),
        "quilting" => quilting(ctx),
        "start_times" => Ok(start_times(ctx)),
        other => Err(Error::InvalidConfigSetting(format!(
            "'{other}' is not a known model_config generator"
        ))
        .into()),
    }
}

/// Total MPI task count from the grid layout, plus the write-server
/// contribution when quilting is enabled. The result is annotated back onto
/// the configuration as `nproc` for the run-command template.
fn pe_member01(ctx: &mut RunContext) -> Result<Mapping> {
    let grid = ConfigNamespace::new(&ctx.grid);
    let mut tasks = grid.require_i64("layout_x")? * grid.require_i64("layout_y")?;

    if ctx.namespace().flag("quilting") {
        tasks += grid.require_i64("write_groups")? * grid.require_i64("write_tasks_per_group")?;
    }

    ctx.annotate_nproc(tasks);

    let mut out = Mapping::new();
    out.insert(Value::from("pe_member01"), Value::from(tasks));
    Ok(out)
}

fn quilting(ctx: &mut RunContext) -> Result<Mapping> {
    let enabled = ctx.namespace().flag("quilting");

    let mut out = Mapping::new();
    out.insert(Value::from("quilting"), Value::Bool(enabled));

    if enabled {
        if let Some(Value::Mapping(extra)) = get_key(&ctx.grid, "quilting") {
            for (key, value) in extra {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(out)
}

fn start_times(ctx: &RunContext) -> Mapping {
    let mut out = Mapping::new();
    for (key, value) in ctx.cycle.start_times() {
        out.insert(Value::from(key), Value::from(value));
    }
    out
}
