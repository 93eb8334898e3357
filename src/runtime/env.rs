//! Working directory and path resolution.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn current_dir_impl(&self) -> Result<PathBuf> {
        env::current_dir().context("Failed to determine current directory")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve path {:?}", path))
    }
}
