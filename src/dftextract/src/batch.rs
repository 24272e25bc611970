//! Many-directory discovery and extraction

use crate::config::Config;
use crate::driver::{process_with, CancelFlag, ExtractionResult};
use crate::error::Result;
use crate::registry::Registry;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every directory below `root` (inclusive) that some backend accepts
///
/// Unreadable entries, and directories whose applicability tests fail with
/// an I/O error, are logged and skipped.
pub fn discover(root: &Path, registry: &Registry, max_depth: usize) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| {
            e.map_err(|err| tracing::warn!(error = %err, "skipping unreadable entry"))
                .ok()
        })
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        match registry.candidates(entry.path()) {
            Ok(candidates) if !candidates.is_empty() => found.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping unreadable directory"),
        }
    }

    tracing::debug!(root = %root.display(), count = found.len(), "discovered calculations");
    Ok(found)
}

/// Detect and extract every directory in parallel
///
/// Output order matches `dirs`; each directory succeeds or fails on its own.
pub fn extract_all<P>(
    dirs: &[P],
    registry: &Registry,
    config: &Config,
    cancel: Option<&CancelFlag>,
) -> Vec<(PathBuf, Result<ExtractionResult>)>
where
    P: AsRef<Path> + Sync,
{
    dirs.par_iter()
        .map(|dir| {
            let dir = dir.as_ref();
            (dir.to_path_buf(), process_with(dir, registry, config, cancel))
        })
        .collect()
}
