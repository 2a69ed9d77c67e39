//! Deletes the units selected in a cleanup preview.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use depsweep_core::{CleanupPreviewEntry, CleanupResult, Ecosystem, MatchType};
use depsweep_scan::{EcosystemRules, rules_for};

use crate::CLEANUP_CHANNEL_SIZE;
use crate::progress::{CleanupComplete, CleanupProgress};

/// Message sent by a background cleanup.
#[derive(Debug)]
pub enum CleanupEvent {
    /// Sent after every processed entry.
    Progress(CleanupProgress),
    /// The run finished.
    Complete(CleanupComplete),
}

/// Executes cleanups one entry at a time.
///
/// A failing entry never aborts the batch; it is reported in its
/// [`CleanupResult`] and the next entry is processed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CleanupExecutor {
    /// Whether to move entries to the trash instead of deleting them.
    pub use_trash: bool,
}

/// Invalid-download markers anywhere below `dir`. Links are not followed.
fn collect_markers(dir: &Path, rules: &dyn EcosystemRules, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_markers(&path, rules, out)?;
        } else if file_type.is_file() && rules.is_invalid_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

impl CleanupExecutor {
    /// Create an executor that deletes permanently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor that uses trash for deletions.
    pub fn with_trash() -> Self {
        Self { use_trash: true }
    }

    fn remove(&self, path: &Path) -> Result<(), String> {
        if self.use_trash {
            return trash::delete(path).map_err(|e| e.to_string());
        }
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| e.to_string())
    }

    /// Remove only the invalid-download markers of a unit, leaving any
    /// complete artifacts in place. Returns the bytes the markers held.
    fn remove_markers(&self, dir: &Path, rules: &dyn EcosystemRules) -> Result<u64, String> {
        let mut markers = Vec::new();
        collect_markers(dir, rules, &mut markers).map_err(|e| e.to_string())?;

        let mut freed = 0;
        let mut errors = Vec::new();
        for marker in &markers {
            let size = fs::symlink_metadata(marker).map(|m| m.len()).unwrap_or(0);
            match self.remove(marker) {
                Ok(()) => freed += size,
                Err(err) => errors.push(format!("{}: {}", marker.display(), err)),
            }
        }
        if errors.is_empty() {
            Ok(freed)
        } else {
            Err(errors.join("; "))
        }
    }

    /// Clean a single entry.
    ///
    /// Returns the result together with the bytes actually freed: the
    /// marker files for invalid entries, the whole entry otherwise.
    pub fn clean_entry(
        &self,
        rules: &dyn EcosystemRules,
        entry: &CleanupPreviewEntry,
    ) -> (CleanupResult, u64) {
        let outcome = if entry.match_type == MatchType::Invalid {
            self.remove_markers(&entry.path, rules)
        } else {
            self.remove(&entry.path).map(|()| entry.file_size)
        };

        match outcome {
            Ok(freed) => {
                tracing::debug!("Cleaned {}", entry.path.display());
                (CleanupResult::succeeded(entry), freed)
            }
            Err(message) => {
                tracing::warn!("Failed to clean {}: {}", entry.path.display(), message);
                (CleanupResult::failed(entry, message), 0)
            }
        }
    }

    /// Clean `entries` in order, reporting progress after each one.
    pub fn execute<F>(
        &self,
        ecosystem: Ecosystem,
        entries: &[CleanupPreviewEntry],
        mut on_progress: F,
    ) -> CleanupComplete
    where
        F: FnMut(&CleanupProgress),
    {
        let rules = rules_for(ecosystem);
        let mut progress = CleanupProgress::new(entries.len());
        let mut results = Vec::with_capacity(entries.len());

        for entry in entries {
            let (result, freed) = self.clean_entry(rules.as_ref(), entry);
            progress.record(&result, freed);
            on_progress(&progress);
            results.push(result);
        }

        let complete = CleanupComplete {
            results,
            bytes_freed: progress.bytes_freed,
        };
        tracing::info!("{}", complete.summary());
        complete
    }
}

/// Start a background cleanup.
///
/// Returns a receiver for progress updates followed by the final result.
/// Must be called from within a tokio runtime.
pub fn start_cleanup(
    ecosystem: Ecosystem,
    entries: Vec<CleanupPreviewEntry>,
    executor: CleanupExecutor,
) -> mpsc::Receiver<CleanupEvent> {
    let (tx, rx) = mpsc::channel(CLEANUP_CHANNEL_SIZE);

    tokio::spawn(async move {
        let tx_progress = tx.clone();
        let result = tokio::task::spawn_blocking(move || {
            executor.execute(ecosystem, &entries, |progress| {
                let _ = tx_progress.blocking_send(CleanupEvent::Progress(progress.clone()));
            })
        })
        .await;

        if let Ok(complete) = result {
            let _ = tx.send(CleanupEvent::Complete(complete)).await;
        }
    });

    rx
}
