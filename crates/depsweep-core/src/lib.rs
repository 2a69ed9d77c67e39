//! Core types and configuration for depsweep.
//!
//! This crate provides the data model shared by the scanning engine and the
//! cleanup executor: package units, match types, filter options, scan
//! summaries and cleanup results.

mod config;
mod ecosystem;
mod error;
mod summary;
mod unit;

pub use config::{
    FilterOptions, FilterOptionsBuilder, MAX_DIRECTORY_DEPTH, ScanConfig, ScanConfigBuilder,
};
pub use ecosystem::Ecosystem;
pub use error::{ScanError, ScanWarning, WarningKind};
pub use summary::{CleanupPreviewEntry, CleanupResult, CleanupSummary};
pub use unit::{MatchType, PackageIdentity, PackageUnit, UNKNOWN};
