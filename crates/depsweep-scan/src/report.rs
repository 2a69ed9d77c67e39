//! Turns classified units into a [`CleanupSummary`].

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jwalk::{Parallelism, WalkDir};

use depsweep_core::{
    CleanupPreviewEntry, CleanupSummary, Ecosystem, MatchType, PackageUnit, ScanWarning,
    WarningKind,
};

/// Recursive size of everything under `path`, in bytes.
///
/// Runs its own full walk: exclusion rules and the depth bound of the
/// discovery walk do not apply. Unreadable entries count as zero.
pub fn directory_size(path: &Path) -> u64 {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_file() => return meta.len(),
        Ok(_) => {}
        Err(_) => return 0,
    }

    WalkDir::new(path)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Modification time of `path`, or the epoch when it cannot be read.
pub fn last_modified(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(UNIX_EPOCH)
}

/// Accumulates the included units of one scan.
#[derive(Debug)]
pub struct ScanReport {
    ecosystem: Ecosystem,
    entries: Vec<CleanupPreviewEntry>,
    warnings: Vec<ScanWarning>,
    total_size: u64,
}

impl ScanReport {
    pub fn new(ecosystem: Ecosystem) -> Self {
        Self {
            ecosystem,
            entries: Vec::new(),
            warnings: Vec::new(),
            total_size: 0,
        }
    }

    /// Add an included unit. Entries start selected.
    pub fn record(&mut self, unit: &PackageUnit, match_type: MatchType) {
        if let Err(err) = fs::metadata(&unit.directory) {
            tracing::warn!("Cannot stat {}: {}", unit.directory.display(), err);
            self.warnings.push(ScanWarning::new(
                &unit.directory,
                err.to_string(),
                WarningKind::MetadataError,
            ));
        }

        let file_size = directory_size(&unit.directory);
        self.total_size += file_size;
        self.entries.push(CleanupPreviewEntry {
            path: unit.directory.clone(),
            relative_path: unit.relative_path.clone(),
            package_name: unit.package_name(self.ecosystem),
            match_type,
            file_size,
            last_modified: last_modified(&unit.directory),
            selected: true,
        });
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish the report.
    ///
    /// `total_scanned_count` is the number of units discovered, included
    /// or not. `warnings` are the walk's warnings.
    pub fn finish(
        mut self,
        total_scanned_count: usize,
        mut warnings: Vec<ScanWarning>,
    ) -> CleanupSummary {
        self.entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        warnings.append(&mut self.warnings);

        CleanupSummary {
            ecosystem: self.ecosystem,
            total_scanned_count,
            total_count: self.entries.len(),
            total_size: self.total_size,
            entries: self.entries,
            warnings,
        }
    }
}
