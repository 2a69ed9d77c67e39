//! Background scanning on the tokio runtime.

use tokio::sync::mpsc;

use depsweep_core::{CleanupSummary, ScanConfig, ScanError};

use crate::progress::{ProgressTracker, ScanObserver, ScanProgress};
use crate::scanner::CacheScanner;

/// Channel buffer size for scan events.
pub const SCAN_CHANNEL_SIZE: usize = 100;

/// Directories between two progress events.
const DIRECTORY_PROGRESS_INTERVAL: u64 = 256;

/// Message sent by a background scan.
#[derive(Debug)]
pub enum ScanEvent {
    /// Periodic progress update.
    Progress(ScanProgress),
    /// The scan finished.
    Complete(Result<CleanupSummary, ScanError>),
}

/// Forwards tracker snapshots without ever blocking the walk.
struct ChannelObserver {
    tracker: ProgressTracker,
    tx: mpsc::Sender<ScanEvent>,
}

impl ChannelObserver {
    fn publish(&self) {
        // A full channel only drops this update; the next one supersedes it.
        let _ = self.tx.try_send(ScanEvent::Progress(self.tracker.snapshot()));
    }
}

impl ScanObserver for ChannelObserver {
    fn on_directory_visited(&mut self, directories_visited: u64) {
        self.tracker.on_directory_visited(directories_visited);
        if directories_visited % DIRECTORY_PROGRESS_INTERVAL == 0 {
            self.publish();
        }
    }

    fn on_unit_classified(&mut self, processed: usize, total: usize) {
        self.tracker.on_unit_classified(processed, total);
        self.publish();
    }
}

/// Start a background scan.
///
/// Returns a receiver that will receive progress updates and, last, the
/// scan result. Must be called from within a tokio runtime.
pub fn start_scan(config: ScanConfig) -> mpsc::Receiver<ScanEvent> {
    let (tx, rx) = mpsc::channel(SCAN_CHANNEL_SIZE);

    tokio::spawn(async move {
        let tx_progress = tx.clone();
        let result = tokio::task::spawn_blocking(move || {
            let scanner = CacheScanner::from_config(&config);
            let mut observer = ChannelObserver {
                tracker: ProgressTracker::new(),
                tx: tx_progress,
            };
            scanner.scan_with(&config.root, &config.filters, &mut observer)
        })
        .await
        .unwrap_or_else(|e| {
            Err(ScanError::Other {
                message: e.to_string(),
            })
        });

        let _ = tx.send(ScanEvent::Complete(result)).await;
    });

    rx
}
