//! Package cache scanning engine for depsweep.
//!
//! This crate walks a package repository (a Maven or Gradle cache, an npm
//! cache or `node_modules` tree, a pip cache or `site-packages`), groups
//! the files it finds into package units and classifies each unit against
//! the selected filters.
//!
//! # Overview
//!
//! - **Walker**: serial, sorted jwalk traversal bounded at
//!   [`MAX_DIRECTORY_DEPTH`], pruning directories the rules exclude
//! - **Rules**: one [`EcosystemRules`] implementation per ecosystem
//! - **Registry**: one unit per unit directory, first file wins
//! - **Classifier**: invalid, matched, native, snapshot, in that order
//!
//! # Example
//!
//! ```rust,no_run
//! use depsweep_scan::{Ecosystem, FilterOptions, ScanConfig, scan};
//!
//! let config = ScanConfig::new("/home/me/.m2/repository", Ecosystem::Maven)
//!     .with_filters(FilterOptions {
//!         include_snapshot: true,
//!         ..Default::default()
//!     });
//! let summary = scan(&config).unwrap();
//!
//! for entry in &summary.entries {
//!     println!("{} ({} bytes)", entry.package_name, entry.file_size);
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use depsweep_scan::{Ecosystem, ScanConfig, ScanEvent, start_scan};
//!
//! # async fn run() {
//! let mut rx = start_scan(ScanConfig::new("/home/me/.npm", Ecosystem::Npm));
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         ScanEvent::Progress(p) => println!("{} directories", p.directories_visited),
//!         ScanEvent::Complete(result) => println!("{:?}", result.map(|s| s.total_count)),
//!     }
//! }
//! # }
//! ```

mod background;
mod classify;
mod locate;
mod progress;
mod registry;
mod report;
pub mod rules;
mod scanner;
mod walker;

pub use background::{SCAN_CHANNEL_SIZE, ScanEvent, start_scan};
pub use classify::{Classification, classify};
pub use locate::{default_root, is_valid_repo_path};
pub use progress::{NoopObserver, ProgressTracker, ScanObserver, ScanPhase, ScanProgress};
pub use registry::UnitRegistry;
pub use report::{ScanReport, directory_size, last_modified};
pub use rules::{EcosystemRules, rules_for, rules_for_config};
pub use scanner::{CacheScanner, scan};
pub use walker::DirectoryWalker;

// Re-export core types for convenience
pub use depsweep_core::{
    CleanupPreviewEntry, CleanupSummary, Ecosystem, FilterOptions, MAX_DIRECTORY_DEPTH, MatchType,
    PackageIdentity, PackageUnit, ScanConfig, ScanError, ScanWarning, WarningKind,
};
