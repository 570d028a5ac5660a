//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("forecast-launch"))
}

/// A complete on-disk configuration tree for one cycle.
struct Fixture {
    tmp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().expect("temp fixture dir");
        let dir = tmp.path();

        let inputs = dir.join("inputs");
        fs::create_dir_all(&inputs).expect("inputs dir");
        fs::write(inputs.join("aerosol.dat"), "climatology\n").expect("aerosol");
        fs::write(inputs.join("sfc_data.nc"), "surface fields\n").expect("sfc");
        fs::write(inputs.join("gfs.2024060112.dat"), "boundary 12z\n").expect("cycledep");

        let exec_dir = dir.join("exec");
        fs::create_dir_all(&exec_dir).expect("exec dir");
        fs::write(exec_dir.join("model.exe"), "#!/bin/sh\necho MODEL OK\n").expect("exe");

        fs::write(
            dir.join("diag.tmpl"),
            "experiment: {expt}\nresolution: {res}\nstart: {starttime}\ncycle: {cycle}\n",
        )
        .expect("diag template");

        fs::write(
            dir.join("base.nml"),
            "&fv_core_nml\n    npz = 64\n    layout = 1, 1\n/\n\n&gfs_physics_nml\n    lsoil = 4\n    imp_physics = 8\n/\n",
        )
        .expect("base namelist");

        fs::write(
            dir.join("grids.yml"),
            "conus:\n  esg:\n    layout_x: 4\n    layout_y: 6\n    write_groups: 2\n    write_tasks_per_group: 3\n    quilting:\n      output_grid: lambert_conformal\n",
        )
        .expect("grids");

        fs::write(dir.join("machines.yml"), "hera:\n  run_command: sh\n  dirs: {}\n")
            .expect("machines");

        fs::write(
            dir.join("namelists.yml"),
            "gfs_v16:\n  fv_core_nml:\n    npz: 65\n",
        )
        .expect("namelists");

        fs::write(
            dir.join("script.yml"),
            "res: 768\nquilting: false\nmodel_config:\n  - {res: config}\n  - pe_member01\n  - quilting\n  - start_times\n",
        )
        .expect("script");

        let fixture = Self { tmp };
        fixture.write_user_config(&fixture.default_user_config());
        fixture
    }

    fn dir(&self) -> &Path {
        self.tmp.path()
    }

    fn workdir(&self) -> PathBuf {
        self.dir().join("comrun").join("run_2024060112")
    }

    fn default_user_config(&self) -> String {
        let dir = self.dir();
        format!(
            r#"paths:
  home: {home}
  grid: {grids}
  machine: {machines}
  namelist: {namelists}
  workdir: {home}/comrun/run_{{cycle}}
  diag_tmpl: {diag}
  base_nml: {nml}
  fix_files: {inputs}
  model_exec: {exec}
grid_name: conus
grid_gen_method: esg
machine: hera
phys_pkg: gfs_v16
expt: rrfs_a
res: 3357
quilting: true
namelist:
  gfs_physics_nml:
    lsoil: null
static:
  copy:
    model_exec:
      - [model.exe, model.exe]
    fix_files:
      - [aerosol.dat, aerosol_in]
  link:
    fix_files:
      - [sfc_data.nc]
cycledep:
  copy:
    fix_files:
      - ['gfs.{{cycle}}.dat', INPUT_gfs.dat]
"#,
            home = dir.display(),
            grids = dir.join("grids.yml").display(),
            machines = dir.join("machines.yml").display(),
            namelists = dir.join("namelists.yml").display(),
            diag = dir.join("diag.tmpl").display(),
            nml = dir.join("base.nml").display(),
            inputs = dir.join("inputs").display(),
            exec = dir.join("exec").display(),
        )
    }

    fn write_user_config(&self, contents: &str) {
        fs::write(self.dir().join("user.yml"), contents).expect("user config");
    }

    fn command(&self, extra: &[&str]) -> Command {
        let mut cmd = bin();
        cmd.args([
            "--user_config",
            self.dir().join("user.yml").to_str().expect("utf8"),
            "--start_date",
            "2024060112",
            "--script_config",
            self.dir().join("script.yml").to_str().expect("utf8"),
        ]);
        cmd.args(extra);
        cmd
    }
}

#[test]
fn test_cli_version() {
    let mut cmd = bin();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("forecast-launch"));
}

#[test]
fn test_cli_help() {
    let mut cmd = bin();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--user_config"))
        .stdout(predicate::str::contains("--start_date"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--overwrite"));
}

#[test]
fn test_required_arguments_are_enforced() {
    let mut cmd = bin();
    cmd.assert().failure();
}

#[test]
fn test_bad_start_date_fails_before_any_file_io() {
    // The user config path doesn't exist; a date-format failure proves the
    // date is validated first.
    let mut cmd = bin();
    cmd.args(["--user_config", "/definitely/not/here.yml", "--start_date", "202406"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not conform to input format YYYYMMDDHH"));
}

#[test]
fn test_dry_run_prepares_a_complete_workdir() {
    let fixture = Fixture::new();

    fixture
        .command(&["--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prepared"))
        .stdout(predicate::str::contains("dry run"));

    let workdir = fixture.workdir();
    assert!(workdir.is_dir());

    // Copied, linked, and cycle-dependent inputs.
    assert_eq!(
        fs::read_to_string(workdir.join("aerosol_in")).expect("copied"),
        "climatology\n"
    );
    assert!(workdir
        .join("sfc_data.nc")
        .symlink_metadata()
        .expect("linked")
        .file_type()
        .is_symlink());
    assert_eq!(
        fs::read_to_string(workdir.join("INPUT_gfs.dat")).expect("cycledep"),
        "boundary 12z\n"
    );
    assert!(workdir.join("model.exe").is_file());

    // The diag table renders with config and cycle bindings substituted.
    let diag = fs::read_to_string(workdir.join("diag_table")).expect("diag");
    assert!(diag.contains("experiment: rrfs_a"));
    assert!(diag.contains("resolution: 3357"));
    assert!(diag.contains("start: 2024-06-01 12:00:00"));
    assert!(diag.contains("cycle: 2024060112"));

    // model_config: user res override, quilting-aware task count, expanded
    // quilting settings, zero-padded start times.
    let model_config: serde_yaml::Mapping = serde_yaml::from_str(
        &fs::read_to_string(workdir.join("model_config")).expect("model_config"),
    )
    .expect("model_config yaml");
    let get = |key: &str| model_config.get(serde_yaml::Value::from(key)).cloned();
    assert_eq!(get("res"), Some(serde_yaml::Value::from(3357)));
    assert_eq!(get("pe_member01"), Some(serde_yaml::Value::from(30)));
    assert_eq!(get("quilting"), Some(serde_yaml::Value::from(true)));
    assert_eq!(get("output_grid"), Some(serde_yaml::Value::from("lambert_conformal")));
    assert_eq!(get("start_hour"), Some(serde_yaml::Value::from("12")));

    // input.nml: overlay applied onto the base namelist, null key removed.
    let nml = fs::read_to_string(workdir.join("input.nml")).expect("input.nml");
    assert!(nml.contains("npz = 65"));
    assert!(nml.contains("imp_physics = 8"));
    assert!(!nml.contains("lsoil"));
}

#[test]
fn test_merge_audit_lines_respect_quiet() {
    let fixture = Fixture::new();
    fixture
        .command(&["--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set res = 3357"));

    let fixture = Fixture::new();
    fixture
        .command(&["--dry-run", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set res").not());
}

#[test]
fn test_existing_workdir_requires_overwrite() {
    let fixture = Fixture::new();
    let workdir = fixture.workdir();
    fs::create_dir_all(&workdir).expect("preexisting workdir");
    fs::write(workdir.join("stale.txt"), "stale").expect("marker");

    fixture
        .command(&["--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists and will not be removed"));
    assert!(workdir.join("stale.txt").exists(), "collision must leave the directory untouched");

    fixture.command(&["--dry-run", "--overwrite"]).assert().success();
    assert!(!workdir.join("stale.txt").exists(), "overwrite must discard old contents");
    assert!(workdir.join("model.exe").is_file());
}

#[cfg(unix)]
#[test]
fn test_launch_streams_model_output() {
    let fixture = Fixture::new();
    fixture
        .command(&["--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MODEL OK"));
}

#[cfg(unix)]
#[test]
fn test_launch_mirrors_model_exit_code() {
    let fixture = Fixture::new();
    fs::write(fixture.dir().join("exec/model.exe"), "#!/bin/sh\nexit 3\n").expect("exe");

    fixture
        .command(&["--quiet"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exited with status 3"));
}

#[test]
fn test_unknown_generator_fails_before_workdir_creation() {
    let fixture = Fixture::new();
    fs::write(
        fixture.dir().join("script.yml"),
        "res: 768\nquilting: false\nmodel_config:\n  - pe_member01\n  - make_coffee\n",
    )
    .expect("script");

    fixture
        .command(&["--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a known model_config generator"));
    assert!(
        !fixture.workdir().exists(),
        "config errors must fire before any filesystem mutation"
    );
}

#[test]
fn test_missing_section_is_reported() {
    let fixture = Fixture::new();
    let user = fixture.default_user_config().replace("phys_pkg: gfs_v16", "phys_pkg: gfs_v99");
    fixture.write_user_config(&user);

    fixture
        .command(&["--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("section 'gfs_v99' does not exist"));
}
