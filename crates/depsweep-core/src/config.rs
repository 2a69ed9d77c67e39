//! Filter and scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::ecosystem::Ecosystem;
use crate::error::ScanError;

/// Maximum directory depth below the repository root that a scan will report.
pub const MAX_DIRECTORY_DEPTH: usize = 20;

/// User-selected filters deciding which units end up in a cleanup preview.
///
/// The value is owned by the caller and passed to every scan explicitly.
/// An empty (or whitespace-only) `target_package` means "no name filter",
/// never "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct FilterOptions {
    /// Include snapshot / prerelease versions.
    pub include_snapshot: bool,

    /// Include units carrying failed or incomplete download markers.
    pub show_invalid_packages: bool,

    /// Include platform-specific native binary packages.
    pub show_platform_specific_binaries: bool,

    /// Package name (or name prefix) to match.
    pub target_package: String,
}

impl FilterOptions {
    /// Create a new filter builder.
    pub fn builder() -> FilterOptionsBuilder {
        FilterOptionsBuilder::default()
    }

    /// The trimmed target package, if one was requested.
    pub fn target(&self) -> Option<&str> {
        let target = self.target_package.trim();
        (!target.is_empty()).then_some(target)
    }

    /// Whether at least one filter is enabled.
    pub fn has_any_filter(&self) -> bool {
        self.include_snapshot
            || self.show_invalid_packages
            || self.show_platform_specific_binaries
            || self.target().is_some()
    }

    /// Reject option sets that would select nothing.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.has_any_filter() {
            Ok(())
        } else {
            Err(ScanError::NoFilterSelected)
        }
    }

    /// Restore every option to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Configuration for one scan of a package repository.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Repository root to scan.
    pub root: PathBuf,

    /// Ecosystem whose conventions apply.
    pub ecosystem: Ecosystem,

    /// Filters selecting which units are reported.
    #[builder(default)]
    #[serde(default)]
    pub filters: FilterOptions,

    /// Maximum depth below the root to traverse.
    #[builder(default = "MAX_DIRECTORY_DEPTH")]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Prune pip `.dist-info` directories installed by another tool.
    #[builder(default = "false")]
    #[serde(default)]
    pub skip_foreign_installers: bool,
}

fn default_max_depth() -> usize {
    MAX_DIRECTORY_DEPTH
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if self.ecosystem.is_none() {
            return Err("Ecosystem is required".to_string());
        }
        if let Some(depth) = self.max_depth {
            if depth == 0 || depth > MAX_DIRECTORY_DEPTH {
                return Err(format!("Max depth must be between 1 and {MAX_DIRECTORY_DEPTH}"));
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with default options for scanning a repository.
    pub fn new(root: impl Into<PathBuf>, ecosystem: Ecosystem) -> Self {
        Self {
            root: root.into(),
            ecosystem,
            filters: FilterOptions::default(),
            max_depth: MAX_DIRECTORY_DEPTH,
            skip_foreign_installers: false,
        }
    }

    /// Replace the filters, keeping everything else.
    pub fn with_filters(mut self, filters: FilterOptions) -> Self {
        self.filters = filters;
        self
    }
}
