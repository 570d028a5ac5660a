//! Run context assembly and the per-cycle working directory.
//!
//! One invocation builds exactly one merged configuration snapshot from the
//! layered sources, resolves the cycle-keyed working directory, and drives
//! staging and control-file rendering. Precedence, lowest to highest:
//! script defaults < grid < machine < namelist < user-supplied overrides.

pub mod model_config;

use crate::config::{self, get_key, interpolate, ConfigNamespace};
use crate::cycle::Cycle;
use crate::error::Error;
use crate::render::{self, render_template};
use crate::stage::Stager;
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Staging sections of the merged configuration, in staging order.
const STAGE_SECTIONS: [&str; 2] = ["static", "cycledep"];

/// Where each configuration document comes from. `None` fields fall back to
/// the path templates in the merged user/script document.
#[derive(Debug, Default)]
pub struct Sources {
    pub user_config: PathBuf,
    pub script_config: Option<PathBuf>,
    pub grid_config: Option<(PathBuf, String)>,
    pub machine_config: Option<(PathBuf, String)>,
    pub nml_config: Option<(PathBuf, String)>,
}

/// The per-run configuration snapshot and its working directory.
pub struct RunContext {
    pub config: Mapping,
    pub grid: Mapping,
    pub machine: Mapping,
    pub nml: Mapping,
    pub cycle: Cycle,
    pub workdir: PathBuf,
    pub quiet: bool,
}

impl RunContext {
    /// Load and merge every configuration source into one snapshot.
    ///
    /// No filesystem mutation happens here; everything loaded is read-only.
    pub fn assemble(sources: &Sources, cycle: Cycle, quiet: bool) -> Result<Self> {
        let user = config::load_document(&sources.user_config)?;

        let script_path = match &sources.script_config {
            Some(path) => path.clone(),
            None => default_script_config(&user)?,
        };
        let script = config::load_document(&script_path)?;

        // User-supplied settings win over script defaults.
        let merged = config::merge(&script, &user, quiet);
        let ns = ConfigNamespace::new(&merged);

        let grid = match &sources.grid_config {
            Some((path, section)) => {
                config::load_section(path, std::slice::from_ref(section))?
            }
            None => {
                let path = interpolate(&ns.require_str("paths.grid")?, &ns, &[])?;
                let mut section_path = vec![ns.require_str("grid_name")?];
                if let Some(method) = ns.scalar("grid_gen_method") {
                    section_path.push(method);
                }
                config::load_section(Path::new(&path), &section_path)?
            }
        };

        let machine = match &sources.machine_config {
            Some((path, section)) => {
                config::load_section(path, std::slice::from_ref(section))?
            }
            None => {
                let path = interpolate(&ns.require_str("paths.machine")?, &ns, &[])?;
                config::load_section(Path::new(&path), &[ns.require_str("machine")?])?
            }
        };

        let nml = match &sources.nml_config {
            Some((path, section)) => {
                config::load_section(path, std::slice::from_ref(section))?
            }
            None => {
                let path = interpolate(&ns.require_str("paths.namelist")?, &ns, &[])?;
                config::load_section(Path::new(&path), &[ns.require_str("phys_pkg")?])?
            }
        };

        // The user/script document may carry sub-overlays for each loaded
        // section; a non-mapping value there (e.g. the machine *name*) is
        // not an overlay and is ignored.
        let grid = config::merge_opt(&grid, get_key(&merged, "grid"), quiet);
        let machine = config::merge_opt(&machine, get_key(&merged, "machine"), quiet);
        let nml = config::merge_opt(&nml, get_key(&merged, "namelist"), quiet);

        let workdir_template = ns.require_str("paths.workdir")?;
        let workdir =
            PathBuf::from(interpolate(&workdir_template, &ns, &cycle_bindings(&cycle))?);

        tracing::debug!(cycle = %cycle.token(), workdir = %workdir.display(), "assembled run context");

        Ok(Self { config: merged, grid, machine, nml, cycle, workdir, quiet })
    }

    /// Point-in-time dotted-path view of the merged configuration.
    pub fn namespace(&self) -> ConfigNamespace {
        ConfigNamespace::new(&self.config)
    }

    /// Extra interpolation bindings available to every template.
    pub fn bindings(&self) -> Vec<(&'static str, String)> {
        cycle_bindings(&self.cycle)
    }

    /// Eager preflight. Every failure detectable from configuration alone
    /// fires here, before the working directory is touched.
    pub fn validate(&self) -> Result<()> {
        let ns = self.namespace();
        let machine = ConfigNamespace::new(&self.machine);
        let bindings = self.bindings();
        let stager = Stager {
            workdir: &self.workdir,
            config: &ns,
            machine: &machine,
            bindings: &bindings,
        };

        for section in STAGE_SECTIONS {
            if let Some(Value::Mapping(manifests)) = get_key(&self.config, section) {
                stager.validate_section(manifests, section)?;
            }
        }

        for template_setting in ["paths.diag_tmpl", "paths.base_nml"] {
            let resolved =
                PathBuf::from(interpolate(&ns.require_str(template_setting)?, &ns, &bindings)?);
            if !resolved.is_file() {
                return Err(Error::NotFound(resolved).into());
            }
        }

        model_config::validate_items(&self.config)?;

        Ok(())
    }

    /// Create the working directory, recreating it when overwriting.
    pub fn create_workdir(&self, overwrite: bool) -> Result<()> {
        if self.workdir.exists() {
            if !overwrite {
                return Err(Error::DirectoryExists(self.workdir.clone()).into());
            }
            fs::remove_dir_all(&self.workdir)
                .with_context(|| format!("failed removing {}", self.workdir.display()))?;
        }

        fs::create_dir_all(&self.workdir)
            .with_context(|| format!("failed creating {}", self.workdir.display()))?;

        Ok(())
    }

    /// Stage inputs and render every control file into the workdir.
    pub fn prepare(&mut self) -> Result<usize> {
        let mut staged = 0;
        {
            let ns = self.namespace();
            let machine = ConfigNamespace::new(&self.machine);
            let bindings = self.bindings();
            let stager = Stager {
                workdir: &self.workdir,
                config: &ns,
                machine: &machine,
                bindings: &bindings,
            };

            for section in STAGE_SECTIONS {
                if let Some(Value::Mapping(manifests)) = get_key(&self.config, section) {
                    staged += stager.stage_section(manifests, section)?;
                }
            }
        }

        self.create_diag_table()?;
        model_config::create_model_config(self)?;
        self.create_namelist()?;

        Ok(staged)
    }

    /// Record the derived total process count on the merged configuration.
    /// This is the one write after projection; it happens during model-config
    /// generation, before any consumer reads `nproc`.
    pub fn annotate_nproc(&mut self, tasks: i64) {
        self.config.insert(Value::from("nproc"), Value::from(tasks));
    }

    fn create_diag_table(&self) -> Result<()> {
        let ns = self.namespace();
        let bindings = self.bindings();
        let template =
            PathBuf::from(interpolate(&ns.require_str("paths.diag_tmpl")?, &ns, &bindings)?);

        let mut vars = bindings;
        vars.push(("starttime", self.cycle.start().format("%Y-%m-%d %H:%M:%S").to_string()));

        render_template(&self.workdir.join("diag_table"), &template, &ns, &vars)
    }

    fn create_namelist(&self) -> Result<()> {
        let ns = self.namespace();
        let bindings = self.bindings();
        let base_path =
            PathBuf::from(interpolate(&ns.require_str("paths.base_nml")?, &ns, &bindings)?);

        let base = render::read_namelist(&base_path)?;
        let merged = config::merge(&base, &self.nml, self.quiet);

        render::write_namelist(&self.workdir.join("input.nml"), &merged)
    }
}

fn cycle_bindings(cycle: &Cycle) -> Vec<(&'static str, String)> {
    vec![("cycle", cycle.token())]
}

/// Default script-settings document, resolved under the install root named
/// by the user config.
fn default_script_config(user: &Mapping) -> Result<PathBuf> {
    let ns = ConfigNamespace::new(user);
    let home = ns.require_str("paths.home").map_err(|_| {
        Error::InvalidConfigSetting(
            "paths.home is required to locate the default script settings".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join("configs").join("model_script.yml"))
}
