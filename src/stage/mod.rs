//! Working-directory staging: copy and link manifests.
//!
//! A staging section (`static` or `cycledep`) holds `copy` and `link`
//! manifests. Each manifest maps a named path-category to an ordered list of
//! 1–2-element entries; the first element names the source (relative to the
//! category's directory), the last names the destination basename. Sources
//! may carry `{dotted.path}` placeholders.

use crate::config::{get_key, interpolate, ConfigNamespace};
use crate::error::Error;
use anyhow::Result;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem action for one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    Copy,
    Link,
}

impl StageAction {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "copy" => Ok(Self::Copy),
            "link" => Ok(Self::Link),
            other => Err(Error::InvalidConfigSetting(format!(
                "staging action '{other}' is not copy or link"
            ))
            .into()),
        }
    }
}

/// Stages manifests from one configuration snapshot into one workdir.
pub struct Stager<'a> {
    pub workdir: &'a Path,
    pub config: &'a ConfigNamespace,
    pub machine: &'a ConfigNamespace,
    pub bindings: &'a [(&'a str, String)],
}

impl Stager<'_> {
    /// Shape-check a staging section without touching the filesystem: every
    /// key must be a known action, every category resolvable, every entry a
    /// 1–2-element list of strings.
    pub fn validate_section(&self, section: &Mapping, origin: &str) -> Result<()> {
        for (key, manifests) in section {
            let action = key_str(key, origin)?;
            StageAction::parse(action)?;

            let Value::Mapping(manifest) = manifests else {
                return Err(Error::InvalidConfigSetting(format!(
                    "{origin}.{action} is not a mapping of path categories"
                ))
                .into());
            };

            for (category, filelist) in manifest {
                let category = key_str(category, origin)?;
                self.category_dir(category)?;

                let Value::Sequence(entries) = filelist else {
                    return Err(Error::InvalidConfigSetting(format!(
                        "{origin}.{action}.{category} is not a list of entries"
                    ))
                    .into());
                };

                for entry in entries {
                    entry_pair(entry, origin, category)?;
                }
            }
        }

        Ok(())
    }

    /// Stage every manifest of a section. Returns the number of files placed.
    pub fn stage_section(&self, section: &Mapping, origin: &str) -> Result<usize> {
        let mut staged = 0;

        for action in ["copy", "link"] {
            if let Some(Value::Mapping(manifest)) = get_key(section, action) {
                staged += self.stage_files(StageAction::parse(action)?, manifest, origin)?;
            }
        }

        Ok(staged)
    }

    /// Apply one action to every entry of one manifest.
    pub fn stage_files(
        &self,
        action: StageAction,
        manifest: &Mapping,
        origin: &str,
    ) -> Result<usize> {
        let mut staged = 0;

        for (category, filelist) in manifest {
            let category = key_str(category, origin)?;
            let category_dir = self.category_dir(category)?;

            let Value::Sequence(entries) = filelist else {
                return Err(Error::InvalidConfigSetting(format!(
                    "{origin}.{category} is not a list of entries"
                ))
                .into());
            };

            for entry in entries {
                let (source, dest) = entry_pair(entry, origin, category)?;

                let source = category_dir.join(interpolate(&source, self.config, self.bindings)?);
                let dest_name = interpolate(&dest, self.config, self.bindings)?;
                let base_name = Path::new(&dest_name)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                let destination = self.workdir.join(base_name.unwrap_or(dest_name));

                match action {
                    StageAction::Copy => safe_copy(&source, &destination)?,
                    StageAction::Link => safe_link(&source, &destination)?,
                }
                tracing::debug!(
                    action = ?action,
                    src = %source.display(),
                    dst = %destination.display(),
                    "staged"
                );
                staged += 1;
            }
        }

        Ok(staged)
    }

    /// Resolve a path-category against the config's `paths` section, then the
    /// machine's `dirs` table.
    fn category_dir(&self, category: &str) -> Result<PathBuf> {
        let raw = self
            .config
            .scalar(&format!("paths.{category}"))
            .or_else(|| self.machine.scalar(&format!("dirs.{category}")));

        match raw {
            Some(template) => Ok(PathBuf::from(interpolate(
                &template,
                self.config,
                self.bindings,
            )?)),
            None => Err(Error::InvalidConfigSetting(format!(
                "cannot find a path entry for '{category}'"
            ))
            .into()),
        }
    }
}

fn key_str<'a>(key: &'a Value, origin: &str) -> Result<&'a str> {
    key.as_str().ok_or_else(|| {
        Error::InvalidConfigSetting(format!("{origin} contains a non-string key")).into()
    })
}

/// One manifest entry: a 1–2-element list of strings. A single element names
/// both the source and the destination.
fn entry_pair(entry: &Value, origin: &str, category: &str) -> Result<(String, String)> {
    let invalid = || {
        Error::InvalidConfigSetting(format!(
            "{origin}.{category} entries must be 1- or 2-element lists of strings"
        ))
    };

    let Value::Sequence(parts) = entry else {
        return Err(invalid().into());
    };
    if parts.is_empty() || parts.len() > 2 {
        return Err(invalid().into());
    }

    let first = parts.first().and_then(Value::as_str).ok_or_else(invalid)?;
    let last = parts.last().and_then(Value::as_str).ok_or_else(invalid)?;
    Ok((first.to_string(), last.to_string()))
}

/// Copy `src` to `dst` after validating both endpoints.
pub fn safe_copy(src: &Path, dst: &Path) -> Result<()> {
    check_endpoints(src, dst)?;
    fs::copy(src, dst)?;
    Ok(())
}

/// Symlink `dst` pointing at `src` after validating both endpoints.
pub fn safe_link(src: &Path, dst: &Path) -> Result<()> {
    check_endpoints(src, dst)?;
    symlink(src, dst)?;
    Ok(())
}

fn check_endpoints(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Err(Error::FileNotFound(src.to_path_buf()).into());
    }

    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    let writable = fs::metadata(parent)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false);
    if !parent.is_dir() || !writable {
        return Err(Error::PathNotFound(parent.to_path_buf()).into());
    }

    Ok(())
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}
