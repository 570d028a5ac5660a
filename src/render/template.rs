//! Control-file template rendering.

use crate::config::{interpolate, ConfigNamespace};
use crate::error::Error;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Render `template` to `outfile`, substituting `{dotted.path}` placeholders
/// from `extra` bindings and the configuration namespace. A placeholder with
/// no binding fails the render; nothing is written in that case.
pub fn render_template(
    outfile: &Path,
    template: &Path,
    ns: &ConfigNamespace,
    extra: &[(&str, String)],
) -> Result<()> {
    if !template.is_file() {
        return Err(Error::NotFound(template.to_path_buf()).into());
    }

    let contents = fs::read_to_string(template)
        .with_context(|| format!("failed reading template: {}", template.display()))?;

    let rendered = interpolate(&contents, ns, extra)
        .with_context(|| format!("rendering template {}", template.display()))?;

    fs::write(outfile, rendered)
        .with_context(|| format!("failed writing {}", outfile.display()))?;

    Ok(())
}
