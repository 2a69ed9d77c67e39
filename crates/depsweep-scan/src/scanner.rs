//! Repository scanner: walk, group, classify, report.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use depsweep_core::{CleanupSummary, FilterOptions, MAX_DIRECTORY_DEPTH, ScanConfig, ScanError};

use crate::classify::classify;
use crate::progress::{NoopObserver, ScanObserver};
use crate::registry::UnitRegistry;
use crate::report::ScanReport;
use crate::rules::{EcosystemRules, rules_for_config};
use crate::walker::DirectoryWalker;

/// Scans one repository root for cleanup candidates.
#[derive(Debug, Clone)]
pub struct CacheScanner {
    rules: Arc<dyn EcosystemRules>,
    max_depth: usize,
}

impl CacheScanner {
    /// Create a scanner for a set of ecosystem rules.
    pub fn new(rules: Arc<dyn EcosystemRules>) -> Self {
        Self {
            rules,
            max_depth: MAX_DIRECTORY_DEPTH,
        }
    }

    /// Create a scanner matching a scan configuration.
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(rules_for_config(config)).with_max_depth(config.max_depth)
    }

    /// Limit traversal depth (never beyond [`MAX_DIRECTORY_DEPTH`]).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DIRECTORY_DEPTH);
        self
    }

    /// The rules this scanner applies.
    pub fn rules(&self) -> &dyn EcosystemRules {
        self.rules.as_ref()
    }

    /// Scan `root` without progress reporting.
    pub fn scan(&self, root: &Path, options: &FilterOptions) -> Result<CleanupSummary, ScanError> {
        self.scan_with(root, options, &mut NoopObserver)
    }

    /// Scan `root`, reporting progress to `observer`.
    ///
    /// Fails with [`ScanError::NoFilterSelected`] before touching the
    /// filesystem when no filter is active. Unreadable entries below the
    /// root become warnings in the summary.
    pub fn scan_with(
        &self,
        root: &Path,
        options: &FilterOptions,
        observer: &mut dyn ScanObserver,
    ) -> Result<CleanupSummary, ScanError> {
        options.validate()?;

        let metadata = fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let start = Instant::now();
        let ecosystem = self.rules.ecosystem();
        tracing::info!("Scanning {} for {} packages", root.display(), ecosystem);

        let walker = DirectoryWalker::new(Arc::clone(&self.rules)).with_max_depth(self.max_depth);
        let mut registry = UnitRegistry::new(root, self.rules.as_ref());
        let mut directories_visited = 0u64;
        let warnings = walker.walk(
            root,
            |_dir| {
                directories_visited += 1;
                observer.on_directory_visited(directories_visited);
            },
            |file| {
                registry.register(file);
            },
        );

        let units = registry.into_units();
        let total = units.len();
        let mut report = ScanReport::new(ecosystem);
        for (index, unit) in units.iter().enumerate() {
            let classification = classify(self.rules.as_ref(), unit, options);
            if classification.include {
                report.record(unit, classification.match_type);
            }
            observer.on_unit_classified(index + 1, total);
        }

        let summary = report.finish(total, warnings);
        tracing::info!(
            "Scanned {} directories, {} units, {} to clean in {:?}",
            directories_visited,
            summary.total_scanned_count,
            summary.total_count,
            start.elapsed()
        );
        Ok(summary)
    }
}

/// Scan the root named by `config` with its filters.
pub fn scan(config: &ScanConfig) -> Result<CleanupSummary, ScanError> {
    CacheScanner::from_config(config).scan(&config.root, &config.filters)
}
