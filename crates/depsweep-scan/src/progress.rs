//! Scan progress reporting.

use std::time::{Duration, Instant};

/// Callbacks invoked synchronously while a scan runs.
///
/// `on_directory_visited` fires once for every directory the walker
/// considers, excluded or not. `on_unit_classified` fires once per
/// discovered unit during classification.
pub trait ScanObserver {
    /// A directory was reached; `directories_visited` is the running count.
    fn on_directory_visited(&mut self, _directories_visited: u64) {}

    /// A unit finished classification.
    fn on_unit_classified(&mut self, _processed: usize, _total: usize) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Phase of a running scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Walking the repository and collecting units.
    Discovering,
    /// Classifying and sizing units.
    Classifying,
}

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Current phase.
    pub phase: ScanPhase,
    /// Number of directories visited so far.
    pub directories_visited: u64,
    /// Number of units classified so far.
    pub units_processed: usize,
    /// Number of units discovered (known once classification starts).
    pub units_total: usize,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Discovering,
            directories_visited: 0,
            units_processed: 0,
            units_total: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of units classified, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.units_total == 0 {
            0.0
        } else {
            self.units_processed as f64 / self.units_total as f64
        }
    }

    /// Directories visited per second.
    pub fn directories_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.directories_visited as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that keeps a running [`ScanProgress`].
#[derive(Debug)]
pub struct ProgressTracker {
    start_time: Instant,
    progress: ScanProgress,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            progress: ScanProgress::new(),
        }
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            elapsed: self.start_time.elapsed(),
            ..self.progress.clone()
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanObserver for ProgressTracker {
    fn on_directory_visited(&mut self, directories_visited: u64) {
        self.progress.directories_visited = directories_visited;
    }

    fn on_unit_classified(&mut self, processed: usize, total: usize) {
        self.progress.phase = ScanPhase::Classifying;
        self.progress.units_processed = processed;
        self.progress.units_total = total;
    }
}
