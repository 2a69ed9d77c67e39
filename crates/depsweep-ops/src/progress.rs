//! Progress reporting types for cleanup runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use depsweep_core::CleanupResult;

/// Format a byte count the way every depsweep message does.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Progress information for an ongoing cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupProgress {
    /// Number of entries processed so far.
    pub completed: usize,
    /// Total number of entries to process.
    pub total: usize,
    /// Number of processed entries that failed.
    pub failed: usize,
    /// Bytes freed by successful entries so far.
    pub bytes_freed: u64,
    /// The entry processed last.
    pub current: Option<PathBuf>,
}

impl CleanupProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            failed: 0,
            bytes_freed: 0,
            current: None,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.completed as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Record one processed entry.
    pub fn record(&mut self, result: &CleanupResult, bytes: u64) {
        self.completed += 1;
        if result.success {
            self.bytes_freed += bytes;
        } else {
            self.failed += 1;
        }
        self.current = Some(result.path.clone());
    }
}

/// Result of a finished cleanup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupComplete {
    /// One result per processed entry, in input order.
    pub results: Vec<CleanupResult>,
    /// Bytes freed by successful entries.
    pub bytes_freed: u64,
}

impl CleanupComplete {
    /// Number of entries cleaned successfully.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of entries that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Check if every entry was cleaned.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        let freed = format_size(self.bytes_freed);
        if self.is_success() {
            format!("Deleted {} items, freed {}", self.succeeded(), freed)
        } else {
            format!(
                "Deleted {} items, freed {}, {} failed",
                self.succeeded(),
                freed,
                self.failed()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depsweep_core::MatchType;

    fn result(success: bool) -> CleanupResult {
        CleanupResult {
            path: PathBuf::from("/r/a"),
            package_name: "a:1.0".to_string(),
            match_type: MatchType::Snapshot,
            success,
            error_message: (!success).then(|| "Permission denied".to_string()),
        }
    }

    #[test]
    fn test_progress_counts() {
        let mut progress = CleanupProgress::new(4);
        progress.record(&result(true), 100);
        progress.record(&result(false), 50);

        assert_eq!(progress.completed, 2);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.bytes_freed, 100);
        assert_eq!(progress.percentage(), 50.0);
        assert_eq!(CleanupProgress::new(0).percentage(), 0.0);
    }

    #[test]
    fn test_summary_text() {
        let complete = CleanupComplete {
            results: vec![result(true), result(true)],
            bytes_freed: 2048,
        };
        assert!(complete.is_success());
        assert_eq!(complete.summary(), "Deleted 2 items, freed 2 KiB");

        let complete = CleanupComplete {
            results: vec![result(true), result(false)],
            bytes_freed: 0,
        };
        assert_eq!(complete.failed(), 1);
        assert_eq!(complete.summary(), "Deleted 1 items, freed 0 B, 1 failed");
    }
}
