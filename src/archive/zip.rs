use crate::cleanup::CleanupGuard;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

use super::{ArchivePlan, ArchiveSummary};

/// Writes an [`ArchivePlan`] as a deflate-compressed .zip file.
///
/// Entries carry the zip format's default timestamp, so rebuilding from the
/// same staged files yields the same archive.
pub struct ZipArchiver;

impl ZipArchiver {
    #[tracing::instrument(skip(self, runtime, plan))]
    pub fn write<R: Runtime>(
        &self,
        runtime: &R,
        plan: &ArchivePlan,
        archive_path: &Path,
    ) -> Result<ArchiveSummary> {
        let bytes = self.build(runtime, plan)?;

        let mut partial_name = archive_path.as_os_str().to_owned();
        partial_name.push(".partial");
        let partial = CleanupGuard::new(runtime, partial_name.into());

        debug!("Writing {} bytes to {:?}", bytes.len(), partial.path());
        runtime
            .write(partial.path(), &bytes)
            .with_context(|| format!("Failed to write archive {:?}", partial.path()))?;
        runtime
            .rename(partial.path(), archive_path)
            .with_context(|| format!("Failed to move archive into place at {:?}", archive_path))?;
        partial.success();

        Ok(ArchiveSummary {
            path: archive_path.to_path_buf(),
            entries: plan.entries.len(),
            skipped: plan.skipped,
        })
    }

    fn build<R: Runtime>(&self, runtime: &R, plan: &ArchivePlan) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &plan.entries {
            let mut options: FileOptions<()> =
                FileOptions::default().compression_method(CompressionMethod::Deflated);
            if let Some(mode) = runtime.unix_mode(&entry.source) {
                options = options.unix_permissions(mode & 0o777);
            }

            zip.start_file(entry.name.as_str(), options)
                .with_context(|| format!("Failed to add {} to archive", entry.name))?;
            let mut source = runtime
                .open(&entry.source)
                .with_context(|| format!("Failed to open {:?}", entry.source))?;
            std::io::copy(&mut source, &mut zip)
                .with_context(|| format!("Failed to compress {:?}", entry.source))?;
            info!("Added to zip: {}", entry.name);
        }

        let cursor = zip.finish().context("Failed to finalize archive")?;
        Ok(cursor.into_inner())
    }
}
