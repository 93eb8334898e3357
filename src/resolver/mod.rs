//! Package resolver capability.
//!
//! Installing dependencies is delegated to an external package manager. The
//! [`PackageResolver`] trait is the seam between the build pipeline and that
//! tool, so the install policy can be exercised against a fake.

mod pip;

use anyhow::Result;
use std::path::PathBuf;

use crate::runtime::CommandOutput;

pub use pip::PipResolver;

/// Outcome of one install invocation: exit code plus captured streams.
pub type InstallOutcome = CommandOutput;

/// Binary-compatibility constraints for the target runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlatform {
    pub platform: String,
    pub implementation: String,
    pub python_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub manifest: PathBuf,
    pub target: PathBuf,
    /// `Some` asks for prebuilt artifacts matching the platform and no
    /// transitive dependencies; `None` allows source builds and full resolution.
    pub constraints: Option<TargetPlatform>,
}

#[cfg_attr(test, mockall::automock)]
pub trait PackageResolver {
    /// Install everything listed in `request.manifest` into `request.target`.
    ///
    /// Returns `Err` only when the package manager could not be started. A
    /// failed install is an `Ok` outcome whose `success()` is false.
    fn install_to(&self, request: &InstallRequest) -> Result<InstallOutcome>;
}
