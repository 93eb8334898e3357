mod zip;

use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use log::debug;
use std::path::{Component, Path, PathBuf};

pub use self::zip::ZipArchiver;

/// One file scheduled for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk.
    pub source: PathBuf,
    /// Entry name inside the archive, `/`-separated and relative to the base dir.
    pub name: String,
}

/// Files to archive, sorted by entry name, plus how many were excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivePlan {
    pub entries: Vec<ArchiveEntry>,
    pub skipped: usize,
}

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub skipped: usize,
}

/// True when `file_name` ends with any of `suffixes`.
pub fn is_excluded(file_name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| file_name.ends_with(suffix.as_str()))
}

/// Archive entry name for `path`, relative to `base_dir`.
fn entry_name(path: &Path, base_dir: &Path) -> Result<String> {
    let relative = pathdiff::diff_paths(path, base_dir)
        .ok_or_else(|| anyhow!("Cannot express {:?} relative to {:?}", path, base_dir))?;

    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => Ok(part.to_string_lossy().into_owned()),
            _ => Err(anyhow!("{:?} is not inside {:?}", path, base_dir)),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

/// Walk `root` and list every file to archive.
///
/// Symlinked directories are listed but not descended into. Entry names are
/// relative to `base_dir`, so the staging root's own name becomes the
/// top-level folder of the archive.
#[tracing::instrument(skip(runtime, suffixes))]
pub fn collect_entries<R: Runtime>(
    runtime: &R,
    root: &Path,
    base_dir: &Path,
    suffixes: &[String],
) -> Result<ArchivePlan> {
    let mut plan = ArchivePlan::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for path in runtime.read_dir(&dir)? {
            if runtime.is_dir(&path) {
                if runtime.is_symlink(&path) {
                    debug!("Not following symlinked directory {:?}", path);
                } else {
                    pending.push(path);
                }
                continue;
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if is_excluded(&file_name, suffixes) {
                debug!("Skipping {:?}", path);
                plan.skipped += 1;
                continue;
            }

            let name = entry_name(&path, base_dir)?;
            plan.entries.push(ArchiveEntry { source: path, name });
        }
    }

    plan.entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(plan)
}
