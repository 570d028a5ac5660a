//! Domain error taxonomy (spec §7).
//!
//! `Error` enumerates the configuration, staging, and launch failures the
//! crate detects itself. YAML/IO errors are wrapped with file context via
//! `anyhow` at the orchestration layer; these variants carry the domain
//! meaning the orchestration layer and tests match on.

use std::path::PathBuf;

use thiserror::Error;

/// Domain errors surfaced by forecast-launch.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced path (config file, template, input root) does not exist.
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    /// A required configuration section is absent from the document.
    #[error("section '{section}' does not exist in top level of {}", .path.display())]
    SectionNotFound { section: String, path: PathBuf },

    /// The target working directory already exists and `--overwrite` was not set.
    #[error("{} exists and will not be removed", .0.display())]
    DirectoryExists(PathBuf),

    /// A configuration setting is missing, malformed, or of the wrong type.
    #[error("{0}")]
    InvalidConfigSetting(String),

    /// A file expected during staging could not be found.
    #[error("{} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// A path's parent directory expected during staging could not be found.
    #[error("{} does not exist", .0.display())]
    PathNotFound(PathBuf),

    /// The start-date argument does not parse as a cycle timestamp.
    #[error("{0} does not conform to input format YYYYMMDDHH[MM[SS]]")]
    DateFormat(String),

    /// A template placeholder had no binding in the configuration.
    #[error("unbound template variable '{name}'")]
    UnboundVariable { name: String },

    /// The model child process exited non-zero or was terminated by a signal.
    #[error("model exited with status {0}")]
    ChildFailed(i32),
}
