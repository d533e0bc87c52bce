//! Filtered overlay copy from the wiki checkout into the pages checkout
//!
//! The copy never clears the destination first. Pages that disappeared from
//! the wiki stay published unless [`prune_stale`] is run afterwards.

use crate::core::error::SyncError;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Version-control metadata directory, never copied
pub const VCS_DIR: &str = ".git";

/// Decides which files of the source checkout are published
#[derive(Debug, Clone)]
pub struct CopyFilter {
    source_root: PathBuf,
    index_source: PathBuf,
    extension: String,
}

impl CopyFilter {
    /// # Arguments
    ///
    /// * `source_root` - Root of the wiki checkout
    /// * `index_source` - File name of the wiki's index page, relative to `source_root`
    /// * `extension` - Published extension without the dot (e.g. `md`)
    pub fn new(source_root: impl Into<PathBuf>, index_source: &str, extension: &str) -> Self {
        let source_root = source_root.into();
        Self {
            index_source: source_root.join(index_source),
            source_root,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Should `source` be copied to `dest`?
    pub fn accepts(&self, source: &Path, dest: &Path) -> bool {
        !self.in_vcs_dir(source) && source != self.index_source && self.is_published(dest)
    }

    /// Does `path` sit inside a `.git` directory of the source checkout?
    pub fn in_vcs_dir(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.source_root).unwrap_or(path);
        relative
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == VCS_DIR))
    }

    /// Does `path` carry the published extension?
    pub fn is_published(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }
}

/// Outcome of an overlay copy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Copied files, relative to the destination root
    pub copied: Vec<PathBuf>,
    /// Files the filter rejected
    pub skipped: usize,
}

/// Copy every accepted file below `filter.source_root()` into `dest_root`
///
/// Directories are created on demand, so a directory holding only rejected
/// files never appears in the destination.
pub fn overlay_copy(filter: &CopyFilter, dest_root: &Path) -> Result<CopyReport, SyncError> {
    let source_root = filter.source_root();
    let mut report = CopyReport::default();

    let walker = WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != VCS_DIR);

    for entry in walker {
        let entry = entry.map_err(|e| SyncError::CopyFailed {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| source_root.to_path_buf()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let source = entry.path();
        let relative = source
            .strip_prefix(source_root)
            .map_err(|e| SyncError::CopyFailed {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;
        let dest = dest_root.join(relative);

        if !filter.accepts(source, &dest) {
            report.skipped += 1;
            continue;
        }

        copy_file(source, &dest)?;
        report.copied.push(relative.to_path_buf());
    }

    Ok(report)
}

/// Copy a single file, creating the destination's parent directories
pub fn copy_file(source: &Path, dest: &Path) -> Result<(), SyncError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::CopyFailed {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    fs::copy(source, dest).map_err(|e| SyncError::CopyFailed {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

/// Remove published files under `dest_root` that are not in `keep`
///
/// `keep` holds paths relative to `dest_root`. Only files with the published
/// extension are considered; `.git` is never entered.
pub fn prune_stale(
    dest_root: &Path,
    keep: &HashSet<PathBuf>,
    extension: &str,
) -> Result<Vec<PathBuf>, SyncError> {
    let extension = extension.trim_start_matches('.');
    let mut stale = Vec::new();

    let walker = WalkDir::new(dest_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != VCS_DIR);

    for entry in walker {
        let entry = entry.map_err(|e| SyncError::CopyFailed {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dest_root.to_path_buf()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file()
            || !entry.path().extension().is_some_and(|ext| ext == extension)
        {
            continue;
        }

        let relative = match entry.path().strip_prefix(dest_root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };

        if !keep.contains(&relative) {
            stale.push(relative);
        }
    }

    for relative in &stale {
        let path = dest_root.join(relative);
        fs::remove_file(&path).map_err(|e| SyncError::CopyFailed {
            path,
            message: e.to_string(),
        })?;
    }

    Ok(stale)
}
