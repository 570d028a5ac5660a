//! Rendered working-directory outputs
//!
//! Control-file templates, deterministic YAML, and Fortran namelists.

pub mod namelist;
pub mod template;

pub use namelist::{read_namelist, write_namelist};
pub use template::render_template;

use anyhow::{Context, Result};
use serde_yaml::Mapping;
use std::fs;
use std::path::Path;

/// Serialize a document to YAML at `path`. Key order follows the document,
/// so repeated runs produce identical output.
pub fn write_yaml(path: &Path, doc: &Mapping) -> Result<()> {
    let rendered = serde_yaml::to_string(doc)
        .with_context(|| format!("failed serializing {}", path.display()))?;
    fs::write(path, rendered).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}
