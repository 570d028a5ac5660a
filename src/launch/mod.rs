//! Model executable invocation.
//!
//! The run command comes from the machine's `run_command` template,
//! interpolated against the merged configuration (which carries `nproc` by
//! the time this runs). Stdout is drained line-by-line so the child never
//! stalls on a full pipe; the child's exit status is the job's exit status.

use crate::config::{interpolate, ConfigNamespace};
use crate::context::RunContext;
use crate::error::Error;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

/// Resolve the staged executable name: the destination basename of the
/// first entry in the static copy manifest's `model_exec` category.
pub fn resolve_executable(ctx: &RunContext) -> Result<String> {
    let ns = ctx.namespace();

    let name = ns
        .get("static.copy.model_exec")
        .and_then(Value::as_sequence)
        .and_then(|entries| entries.first())
        .and_then(Value::as_sequence)
        .and_then(|entry| entry.last())
        .and_then(Value::as_str)
        .map(|dest| {
            Path::new(dest)
                .file_name()
                .map(|base| base.to_string_lossy().into_owned())
                .unwrap_or_else(|| dest.to_string())
        });

    name.ok_or_else(|| {
        Error::InvalidConfigSetting(
            "static.copy.model_exec must stage the model executable".to_string(),
        )
        .into()
    })
}

/// Launch the model and wait for it, streaming its stdout to the console.
pub fn launch(ctx: &RunContext) -> Result<()> {
    let ns = ctx.namespace();
    let machine = ConfigNamespace::new(&ctx.machine);

    let run_command =
        interpolate(&machine.require_str("run_command")?, &ns, &ctx.bindings())?;
    let executable = resolve_executable(ctx)?;

    let mut argv = split_command(&run_command)?;
    argv.push(format!("./{executable}"));

    tracing::info!(command = %argv.join(" "), workdir = %ctx.workdir.display(), "launching model");

    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .current_dir(&ctx.workdir)
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to launch '{}'", argv.join(" ")))?;

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            println!("{}", line.context("reading model output")?);
        }
    }

    let status = child.wait().context("waiting for model executable")?;
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(Error::ChildFailed(code).into()),
        // Killed by a signal; report shell-style.
        None => Err(Error::ChildFailed(128 + termination_signal(&status)).into()),
    }
}

/// Split a run command into argv, honoring single and double quotes.
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in command.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    in_word = true;
                }
                ch if ch.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                ch => {
                    current.push(ch);
                    in_word = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err(Error::InvalidConfigSetting(format!(
            "unterminated quote in run command: '{command}'"
        ))
        .into());
    }
    if in_word {
        words.push(current);
    }
    if words.is_empty() {
        return Err(Error::InvalidConfigSetting("run command is empty".to_string()).into());
    }

    Ok(words)
}

#[cfg(unix)]
fn termination_signal(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(0)
}

#[cfg(not(unix))]
fn termination_signal(_status: &std::process::ExitStatus) -> i32 {
    0
}
