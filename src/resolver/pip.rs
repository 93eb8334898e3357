use anyhow::{Context, Result};
use log::debug;

use super::{InstallOutcome, InstallRequest, PackageResolver};
use crate::runtime::Runtime;

/// Resolver backed by `<python> -m pip install`.
pub struct PipResolver<R: Runtime> {
    runtime: R,
    python: String,
}

impl<R: Runtime> PipResolver<R> {
    pub fn new(runtime: R, python: impl Into<String>) -> Self {
        Self {
            runtime,
            python: python.into(),
        }
    }
}

/// Build the argument list passed to the interpreter.
pub(crate) fn pip_args(request: &InstallRequest) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-m".into(),
        "pip".into(),
        "install".into(),
        "-r".into(),
        request.manifest.to_string_lossy().into_owned(),
        "-t".into(),
        request.target.to_string_lossy().into_owned(),
    ];

    match &request.constraints {
        Some(target) => {
            args.extend([
                "--platform".into(),
                target.platform.clone(),
                "--implementation".into(),
                target.implementation.clone(),
                "--python-version".into(),
                target.python_version.clone(),
                "--only-binary=:all:".into(),
                "--no-deps".into(),
            ]);
        }
        None => args.push("--no-cache-dir".into()),
    }

    args
}

impl<R: Runtime> PackageResolver for PipResolver<R> {
    #[tracing::instrument(skip(self))]
    fn install_to(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        let args = pip_args(request);
        debug!("Running {} {}", self.python, args.join(" "));
        self.runtime
            .run_command(&self.python, &args)
            .with_context(|| format!("Failed to launch package manager via {}", self.python))
    }
}
