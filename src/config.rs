//! Build configuration.
//!
//! Every knob of a layer build lives in [`BuildConfig`]. Values are layered:
//! built-in defaults, then an optional JSON file, then command-line flags.

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::resolver::TargetPlatform;
use crate::runtime::Runtime;

pub const DEFAULT_MANIFEST: &str = "requirements.txt";
pub const DEFAULT_LAYER_DIR: &str = "python";
pub const DEFAULT_PYTHON_VERSION: &str = "3.12";
pub const DEFAULT_PLATFORM: &str = "manylinux2014_x86_64";
pub const DEFAULT_IMPLEMENTATION: &str = "cp";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_ARCHIVE_NAME: &str = "python.zip";
pub const DEFAULT_EXCLUDE_SUFFIXES: &[&str] = &[".pyc", ".pyo", ".dist-info"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Manifest file name, resolved against the project directory.
    pub manifest: PathBuf,
    /// Staging root name; also the top-level folder inside the archive.
    pub layer_dir: String,
    /// Target interpreter version, e.g. "3.12".
    pub python_version: String,
    /// Platform tag for the binary-only install pass.
    pub platform: String,
    /// Interpreter implementation tag ("cp" for CPython).
    pub implementation: String,
    /// Interpreter used to run `-m pip`.
    pub python: String,
    /// Output archive file name, written to the project directory.
    pub archive_name: String,
    /// Files whose name ends with one of these are left out of the archive.
    pub exclude_suffixes: Vec<String>,
    /// Leave the staging directory in place after archiving.
    pub keep_staging: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            layer_dir: DEFAULT_LAYER_DIR.to_string(),
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            implementation: DEFAULT_IMPLEMENTATION.to_string(),
            python: DEFAULT_PYTHON.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            exclude_suffixes: DEFAULT_EXCLUDE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keep_staging: false,
        }
    }
}

impl BuildConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading build config from {:?}", path);
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: BuildConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    /// `layer_dir` and `archive_name` must each name one entry directly
    /// inside the project directory, and must not name the same entry.
    pub fn validate(&self) -> Result<()> {
        single_name("layer_dir", &self.layer_dir)?;
        single_name("archive_name", &self.archive_name)?;
        if self.layer_dir == self.archive_name {
            bail!(
                "archive_name {:?} collides with layer_dir {:?}",
                self.archive_name,
                self.layer_dir
            );
        }
        Ok(())
    }

    /// `lib/python<ver>/site-packages`, relative to the staging root.
    pub fn site_packages_subpath(&self) -> PathBuf {
        Path::new("lib")
            .join(format!("python{}", self.python_version))
            .join("site-packages")
    }

    pub fn target_platform(&self) -> TargetPlatform {
        TargetPlatform {
            platform: self.platform.clone(),
            implementation: self.implementation.clone(),
            python_version: self.python_version.clone(),
        }
    }
}

fn single_name(field: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => bail!(
            "{} must be a plain name inside the project directory, got {:?}",
            field,
            value
        ),
    }
}
