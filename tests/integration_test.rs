use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;
use zip::ZipArchive;

const SITE: &str = "python/lib/python3.12/site-packages";

/// Stand-in for `python -m pip install`: writes a small package into the
/// `-t` target. `FAKE_PIP_FAIL_BINARY` makes the `--platform` pass fail and
/// `FAKE_PIP_FAIL_SOURCE` makes the unconstrained pass fail.
#[cfg(unix)]
const FAKE_PYTHON: &str = r#"#!/bin/sh
target=""
constrained=0
while [ $# -gt 0 ]; do
  case "$1" in
    -t|--target) target="$2"; shift 2 ;;
    --platform) constrained=1; shift 2 ;;
    *) shift ;;
  esac
done
echo "pass constrained=$constrained" >> "$FAKE_PIP_LOG"
if [ "$constrained" = 1 ] && [ -n "$FAKE_PIP_FAIL_BINARY" ]; then
  echo "ERROR: No matching distribution found for numpy" >&2
  exit 1
fi
if [ "$constrained" = 0 ] && [ -n "$FAKE_PIP_FAIL_SOURCE" ]; then
  echo "Collecting numpy"
  echo "error: subprocess-exited-with-error" >&2
  exit 1
fi
mkdir -p "$target/numpy/__pycache__" "$target/numpy-1.26.4.dist-info"
printf 'import sys\n' > "$target/numpy/__init__.py"
printf 'bytecode' > "$target/numpy/__pycache__/__init__.cpython-312.pyc"
printf 'Name: numpy\n' > "$target/numpy-1.26.4.dist-info/METADATA"
if [ "$constrained" = 1 ]; then
  printf 'wheel' > "$target/INSTALLED_FROM_WHEEL"
else
  printf 'sdist' > "$target/INSTALLED_FROM_SOURCE"
fi
echo "Successfully installed numpy-1.26.4"
"#;

#[cfg(unix)]
fn write_fake_python(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-python");
    fs::write(&path, FAKE_PYTHON).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn archive_names(path: &Path) -> BTreeSet<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(|n| n.to_string()).collect()
}

fn layerpack() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("layerpack"));
    cmd.env_remove("LAYERPACK_PROJECT_DIR")
        .env_remove("LAYERPACK_CONFIG")
        .env_remove("LAYERPACK_PYTHON");
    cmd
}

#[test]
#[cfg(unix)]
fn test_end_to_end_build_with_wheels() {
    let project = tempdir().unwrap();
    let tools = tempdir().unwrap();
    let python = write_fake_python(tools.path());
    let log = tools.path().join("pip.log");
    fs::write(project.path().join("requirements.txt"), "numpy==1.26.4\n").unwrap();

    layerpack()
        .arg("build")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--python")
        .arg(&python)
        .env("FAKE_PIP_LOG", &log)
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let names = archive_names(&project.path().join("python.zip"));
    assert_eq!(
        names,
        BTreeSet::from([
            format!("{SITE}/INSTALLED_FROM_WHEEL"),
            format!("{SITE}/numpy-1.26.4.dist-info/METADATA"),
            format!("{SITE}/numpy/__init__.py"),
        ])
    );
    assert_eq!(fs::read_to_string(&log).unwrap(), "pass constrained=1\n");
    assert!(!project.path().join("python").exists());
}

#[test]
#[cfg(unix)]
fn test_end_to_end_build_falls_back_to_source() {
    let project = tempdir().unwrap();
    let tools = tempdir().unwrap();
    let python = write_fake_python(tools.path());
    let log = tools.path().join("pip.log");
    fs::write(project.path().join("requirements.txt"), "numpy==1.26.4\n").unwrap();

    layerpack()
        .current_dir(project.path())
        .arg("build")
        .env("LAYERPACK_PYTHON", &python)
        .env("FAKE_PIP_LOG", &log)
        .env("FAKE_PIP_FAIL_BINARY", "1")
        .assert()
        .success();

    let names = archive_names(&project.path().join("python.zip"));
    assert!(names.contains(&format!("{SITE}/INSTALLED_FROM_SOURCE")));
    assert!(!names.contains(&format!("{SITE}/INSTALLED_FROM_WHEEL")));
    assert_eq!(
        fs::read_to_string(&log).unwrap(),
        "pass constrained=1\npass constrained=0\n"
    );
}

#[test]
#[cfg(unix)]
fn test_end_to_end_fallback_failure_exits_non_zero() {
    let project = tempdir().unwrap();
    let tools = tempdir().unwrap();
    let python = write_fake_python(tools.path());
    fs::write(project.path().join("requirements.txt"), "numpy==1.26.4\n").unwrap();
    let archive = project.path().join("python.zip");
    fs::write(&archive, "archive from an earlier build").unwrap();

    layerpack()
        .arg("-C")
        .arg(project.path())
        .arg("build")
        .arg("--python")
        .arg(&python)
        .env("FAKE_PIP_LOG", tools.path().join("pip.log"))
        .env("FAKE_PIP_FAIL_BINARY", "1")
        .env("FAKE_PIP_FAIL_SOURCE", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to install dependencies"))
        .stderr(predicate::str::contains("Collecting numpy"))
        .stderr(predicate::str::contains("subprocess-exited-with-error"));

    assert_eq!(
        fs::read_to_string(&archive).unwrap(),
        "archive from an earlier build"
    );

    // the failed build leaves its staging directory behind
    assert!(project.path().join("python").exists());
    layerpack()
        .arg("-C")
        .arg(project.path())
        .arg("clean")
        .assert()
        .success();
    assert!(!project.path().join("python").exists());
}

#[test]
fn test_end_to_end_missing_manifest_builds_empty_archive() {
    let project = tempdir().unwrap();

    layerpack()
        .arg("build")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--python")
        .arg("layerpack-python-must-not-run")
        .assert()
        .success();

    assert!(archive_names(&project.path().join("python.zip")).is_empty());
}

#[test]
fn test_end_to_end_config_file() {
    let project = tempdir().unwrap();
    let config = project.path().join("layerpack.json");
    fs::write(&config, r#"{ "archive_name": "deps.zip", "layer_dir": "python" }"#).unwrap();

    layerpack()
        .arg("build")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(project.path().join("deps.zip").exists());
    assert!(!project.path().join("python.zip").exists());
}

#[test]
fn test_invalid_config_file_fails() {
    let project = tempdir().unwrap();
    let config = project.path().join("layerpack.json");
    fs::write(&config, r#"{ "archive": "typo.zip" }"#).unwrap();

    layerpack()
        .arg("build")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_config_layer_dir_naming_project_fails() {
    let project = tempdir().unwrap();
    fs::write(project.path().join("requirements.txt"), "numpy==1.26.4\n").unwrap();
    let config = project.path().join("layerpack.json");
    fs::write(&config, r#"{ "layer_dir": "." }"#).unwrap();

    layerpack()
        .arg("build")
        .arg("--project-dir")
        .arg(project.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("layer_dir"));

    assert!(project.path().join("requirements.txt").exists());
}

#[test]
fn test_missing_project_dir_fails() {
    let project = tempdir().unwrap();

    layerpack()
        .arg("build")
        .arg("--project-dir")
        .arg(project.path().join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve path"));
}

#[test]
fn test_clean_with_nothing_to_clean() {
    let project = tempdir().unwrap();

    layerpack()
        .arg("clean")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean."));
}

#[test]
fn test_version_flag() {
    layerpack().arg("--version").assert().success();
}
