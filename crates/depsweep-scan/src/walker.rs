//! Depth-bounded, pruning directory walk built on jwalk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};

use depsweep_core::{MAX_DIRECTORY_DEPTH, ScanWarning, WarningKind};

use crate::rules::EcosystemRules;

/// Walks a repository, skipping directories the rules exclude.
///
/// Traversal is single-threaded and sorted, so repeated walks of an
/// unchanged tree visit entries in the same order. Entries deeper than
/// `max_depth` (counted from the root, root = 0) are never reported.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    rules: Arc<dyn EcosystemRules>,
    max_depth: usize,
}

/// Whether a linked directory points at one of its own ancestors.
fn is_symlink_loop(dir: &Path) -> bool {
    let Ok(meta) = fs::symlink_metadata(dir) else {
        return false;
    };
    if !meta.file_type().is_symlink() {
        return false;
    }
    match (fs::canonicalize(dir), dir.parent().map(fs::canonicalize)) {
        (Ok(target), Some(Ok(parent))) => parent.starts_with(&target),
        _ => false,
    }
}

impl DirectoryWalker {
    pub fn new(rules: Arc<dyn EcosystemRules>) -> Self {
        Self {
            rules,
            max_depth: MAX_DIRECTORY_DEPTH,
        }
    }

    /// Limit traversal depth. Values above the global bound are clamped.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DIRECTORY_DEPTH);
        self
    }

    /// Walk `root`, calling `on_directory` for every directory considered
    /// (excluded ones included) and `on_file` for every regular file that
    /// is not below an excluded directory.
    ///
    /// Unreadable entries are logged and returned as warnings; they never
    /// abort the walk.
    pub fn walk<D, F>(&self, root: &Path, mut on_directory: D, mut on_file: F) -> Vec<ScanWarning>
    where
        D: FnMut(&Path),
        F: FnMut(&Path),
    {
        let rules = Arc::clone(&self.rules);
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(true)
            .sort(true)
            .min_depth(1)
            .max_depth(self.max_depth)
            .process_read_dir(move |depth, _path, _state, children| {
                // The root itself is listed with no depth; it is never excluded.
                if depth.is_none() {
                    return;
                }
                for child in children.iter_mut().flatten() {
                    if !child.file_type.is_dir() {
                        continue;
                    }
                    let path = child.path();
                    if rules.should_exclude(&path) || is_symlink_loop(&path) {
                        tracing::debug!("Skipping {}", path.display());
                        child.read_children_path = None;
                    }
                }
            });

        let mut warnings = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::warn!("Cannot read {}: {}", path.display(), err);
                    warnings.push(match err.io_error() {
                        Some(io_err) => ScanWarning::from_io(path, io_err),
                        None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
                    });
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_dir() {
                on_directory(&path);
            } else if file_type.is_file() {
                on_file(&path);
            }
        }
        warnings
    }
}
