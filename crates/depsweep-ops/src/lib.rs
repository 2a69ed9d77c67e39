//! Cleanup execution engine for depsweep.
//!
//! This crate deletes the entries selected in a scan's cleanup preview,
//! one at a time, with progress reporting via callbacks or channels.
//! Entries classified as invalid only lose their failed-download markers;
//! every other entry is removed recursively.

mod executor;
mod progress;

pub use executor::{CleanupEvent, CleanupExecutor, start_cleanup};
pub use progress::{CleanupComplete, CleanupProgress, format_size};

/// Default channel buffer size for cleanup progress updates.
pub const CLEANUP_CHANNEL_SIZE: usize = 100;
