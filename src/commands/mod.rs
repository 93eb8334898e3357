use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::cleanup::remove_staging;
use crate::config::BuildConfig;
use crate::layout::LayerPaths;
use crate::pipeline::{BuildReport, Pipeline};
use crate::resolver::PipResolver;
use crate::runtime::Runtime;

/// Command-line overrides applied on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub python: Option<String>,
    pub python_version: Option<String>,
    pub platform: Option<String>,
    pub archive_name: Option<String>,
    pub keep_staging: bool,
}

impl Overrides {
    fn apply(self, config: &mut BuildConfig) {
        if let Some(python) = self.python {
            config.python = python;
        }
        if let Some(version) = self.python_version {
            config.python_version = version;
        }
        if let Some(platform) = self.platform {
            config.platform = platform;
        }
        if let Some(name) = self.archive_name {
            config.archive_name = name;
        }
        if self.keep_staging {
            config.keep_staging = true;
        }
    }
}

/// Absolute project directory: the given one, or the current directory.
fn project_dir<R: Runtime>(runtime: &R, project_dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match project_dir {
        Some(path) => path,
        None => runtime.current_dir()?,
    };
    runtime.canonicalize(&dir)
}

fn load_config<R: Runtime>(runtime: &R, config_path: Option<&Path>) -> Result<BuildConfig> {
    match config_path {
        Some(path) => BuildConfig::load(runtime, path),
        None => Ok(BuildConfig::default()),
    }
}

/// Build the layer archive for `project_dir`.
#[tracing::instrument(skip(runtime, overrides))]
pub fn build<R: Runtime + Clone>(
    runtime: R,
    project_dir_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
    overrides: Overrides,
) -> Result<BuildReport> {
    let base_dir = project_dir(&runtime, project_dir_arg)?;
    let mut config = load_config(&runtime, config_path.as_deref())?;
    overrides.apply(&mut config);
    config.validate()?;
    debug!("Effective build config: {:?}", config);

    let resolver = PipResolver::new(runtime.clone(), config.python.clone());
    let pipeline = Pipeline::new(runtime, resolver, config);
    let report = pipeline.run(&base_dir)?;

    println!(
        "     created {} ({} files, {} skipped, dependencies: {})",
        report.archive.path.display(),
        report.archive.entries,
        report.archive.skipped,
        report.install.describe()
    );
    Ok(report)
}

/// Remove a staging directory left behind by a failed build.
#[tracing::instrument(skip(runtime))]
pub fn clean<R: Runtime>(
    runtime: R,
    project_dir_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let base_dir = project_dir(&runtime, project_dir_arg)?;
    let config = load_config(&runtime, config_path.as_deref())?;
    let paths = LayerPaths::resolve(&config, &base_dir)?;

    if remove_staging(&runtime, &paths)? {
        println!("     removed {}", paths.staging_root.display());
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}
