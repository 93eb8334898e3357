use anyhow::{Context, Result};
use log::{debug, info};

use crate::layout::LayerPaths;
use crate::runtime::Runtime;

/// Recreate the staging tree from scratch.
///
/// A staging root left over from an earlier run is removed first, then the
/// full `site-packages` path is created including intermediate directories.
#[tracing::instrument(skip(runtime, paths))]
pub fn prepare<R: Runtime>(runtime: &R, paths: &LayerPaths) -> Result<()> {
    if runtime.exists(&paths.staging_root) {
        debug!("Removing stale staging directory {:?}", paths.staging_root);
        runtime
            .remove_dir_all(&paths.staging_root)
            .with_context(|| {
                format!(
                    "Failed to remove existing staging directory {:?}",
                    paths.staging_root
                )
            })?;
    }

    runtime
        .create_dir_all(&paths.site_packages)
        .with_context(|| {
            format!(
                "Failed to create site-packages directory {:?}",
                paths.site_packages
            )
        })?;
    info!("Created site-packages directory: {:?}", paths.site_packages);
    Ok(())
}
