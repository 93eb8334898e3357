use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;

/// Every location a build touches, derived from the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPaths {
    pub base_dir: PathBuf,
    pub manifest: PathBuf,
    /// Top-level layer folder, e.g. `<base>/python`.
    pub staging_root: PathBuf,
    /// Install target, e.g. `<base>/python/lib/python3.12/site-packages`.
    pub site_packages: PathBuf,
    pub archive: PathBuf,
}

impl LayerPaths {
    /// Fails when the config would place staging or the archive outside a
    /// dedicated entry of `base_dir`.
    pub fn resolve(config: &BuildConfig, base_dir: &Path) -> Result<Self> {
        config.validate()?;
        let staging_root = base_dir.join(&config.layer_dir);
        let site_packages = staging_root.join(config.site_packages_subpath());

        let archive = base_dir.join(&config.archive_name);
        if archive.starts_with(&staging_root) {
            bail!(
                "archive {:?} would be written inside the staging directory {:?}",
                archive,
                staging_root
            );
        }

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            manifest: base_dir.join(&config.manifest),
            staging_root,
            site_packages,
            archive,
        })
    }
}
