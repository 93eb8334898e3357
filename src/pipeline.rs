//! The layer build, as an explicit sequence of stages:
//! resolve paths, stage, install, archive, clean up.

use anyhow::Result;
use log::{debug, info};
use std::path::Path;

use crate::archive::{ArchiveSummary, ZipArchiver, collect_entries};
use crate::cleanup::remove_staging;
use crate::config::BuildConfig;
use crate::installer::{InstallReport, install_dependencies};
use crate::layout::LayerPaths;
use crate::resolver::PackageResolver;
use crate::runtime::Runtime;
use crate::staging;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub paths: LayerPaths,
    pub install: InstallReport,
    pub archive: ArchiveSummary,
    /// False when `keep_staging` left the staging directory in place.
    pub staging_removed: bool,
}

pub struct Pipeline<R: Runtime, P: PackageResolver> {
    runtime: R,
    resolver: P,
    config: BuildConfig,
}

impl<R: Runtime, P: PackageResolver> Pipeline<R, P> {
    pub fn new(runtime: R, resolver: P, config: BuildConfig) -> Self {
        Self {
            runtime,
            resolver,
            config,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn run(&self, base_dir: &Path) -> Result<BuildReport> {
        let paths = LayerPaths::resolve(&self.config, base_dir)?;
        debug!("Resolved layer paths: {:?}", paths);
        info!("Expected manifest path: {:?}", paths.manifest);

        println!("     staging {}", paths.site_packages.display());
        staging::prepare(&self.runtime, &paths)?;

        println!("  installing {}", paths.manifest.display());
        let install = install_dependencies(
            &self.runtime,
            &self.resolver,
            &paths,
            &self.config.target_platform(),
        )?;
        info!("Dependencies: {}", install.describe());

        println!("   archiving {}", paths.archive.display());
        let plan = collect_entries(
            &self.runtime,
            &paths.staging_root,
            &paths.base_dir,
            &self.config.exclude_suffixes,
        )?;
        let archive = ZipArchiver.write(&self.runtime, &plan, &paths.archive)?;

        let staging_removed = if self.config.keep_staging {
            info!("Keeping staging directory {:?}", paths.staging_root);
            false
        } else {
            println!("    cleaning {}", paths.staging_root.display());
            remove_staging(&self.runtime, &paths)?
        };

        Ok(BuildReport {
            paths,
            install,
            archive,
            staging_removed,
        })
    }
}
