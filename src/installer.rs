use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::layout::LayerPaths;
use crate::resolver::{InstallOutcome, InstallRequest, PackageResolver, TargetPlatform};
use crate::runtime::Runtime;

/// Which install pass produced the staged dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallReport {
    /// No manifest; nothing was installed.
    Skipped,
    /// The binary-only, platform-constrained pass succeeded.
    Constrained(InstallOutcome),
    /// The constrained pass failed and the unconstrained retry succeeded.
    Fallback(InstallOutcome),
}

impl InstallReport {
    pub fn describe(&self) -> &'static str {
        match self {
            InstallReport::Skipped => "skipped (no manifest)",
            InstallReport::Constrained(_) => "prebuilt wheels",
            InstallReport::Fallback(_) => "fallback (unconstrained)",
        }
    }
}

/// Install the manifest's dependencies into the staging `site-packages`.
///
/// The first pass asks for prebuilt artifacts for `platform`. If it exits
/// non-zero, a second pass without constraints runs against the same target.
/// Only a failure of that second pass is an error.
#[tracing::instrument(skip(runtime, resolver, paths, platform))]
pub fn install_dependencies<R: Runtime, P: PackageResolver>(
    runtime: &R,
    resolver: &P,
    paths: &LayerPaths,
    platform: &TargetPlatform,
) -> Result<InstallReport> {
    if !runtime.exists(&paths.manifest) {
        warn!(
            "Could not install dependencies: {:?} not found",
            paths.manifest
        );
        return Ok(InstallReport::Skipped);
    }
    info!("Installing dependencies from {:?}", paths.manifest);

    let constrained = InstallRequest {
        manifest: paths.manifest.clone(),
        target: paths.site_packages.clone(),
        constraints: Some(platform.clone()),
    };
    let outcome = resolver.install_to(&constrained)?;
    if outcome.success() {
        debug!("{}", outcome.stdout);
        return Ok(InstallReport::Constrained(outcome));
    }

    warn!(
        "Some packages could not be installed as {} wheels ({}). Trying source installation...",
        platform.platform, outcome
    );
    debug!("Constrained install stderr: {}", outcome.stderr);

    let fallback = InstallRequest {
        constraints: None,
        ..constrained
    };
    let outcome = resolver.install_to(&fallback)?;
    if !outcome.success() {
        bail!(
            "Failed to install dependencies ({}):\n{}\n{}",
            outcome,
            outcome.stdout.trim_end(),
            outcome.stderr.trim_end()
        );
    }

    debug!("{}", outcome.stdout);
    Ok(InstallReport::Fallback(outcome))
}
