use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::layout::LayerPaths;
use crate::runtime::Runtime;

/// RAII guard that removes a temporary path when dropped, unless the
/// operation that produced it was marked successful.
pub struct CleanupGuard<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    armed: bool,
}

impl<'a, R: Runtime> CleanupGuard<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self {
            runtime,
            path,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the path; nothing is removed on drop.
    pub fn success(mut self) {
        self.armed = false;
    }
}

impl<R: Runtime> Drop for CleanupGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed || !self.runtime.exists(&self.path) {
            return;
        }
        debug!("Cleaning up: {:?}", self.path);
        let result = if self.runtime.is_dir(&self.path) {
            self.runtime.remove_dir_all(&self.path)
        } else {
            self.runtime.remove_file(&self.path)
        };
        if let Err(e) = result {
            debug!("Failed to clean up {:?}: {}", self.path, e);
        }
    }
}

/// Remove the staging root created by the staging stage.
#[tracing::instrument(skip(runtime, paths))]
pub fn remove_staging<R: Runtime>(runtime: &R, paths: &LayerPaths) -> Result<bool> {
    if !runtime.exists(&paths.staging_root) {
        debug!("Staging directory {:?} already gone", paths.staging_root);
        return Ok(false);
    }
    runtime
        .remove_dir_all(&paths.staging_root)
        .with_context(|| {
            format!(
                "Failed to remove staging directory {:?}",
                paths.staging_root
            )
        })?;
    Ok(true)
}
