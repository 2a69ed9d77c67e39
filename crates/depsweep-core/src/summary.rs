//! Scan output and cleanup result types.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::ecosystem::Ecosystem;
use crate::error::ScanWarning;
use crate::unit::MatchType;

/// One reportable unit as shown in a cleanup preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPreviewEntry {
    /// Absolute path of the unit directory.
    pub path: PathBuf,
    /// Unit directory relative to the repository root.
    pub relative_path: String,
    /// Display name including the version.
    pub package_name: String,
    /// Why the unit was selected.
    pub match_type: MatchType,
    /// Recursive size of the unit directory in bytes.
    pub file_size: u64,
    /// Modification time of the unit directory.
    pub last_modified: SystemTime,
    /// Whether the entry is selected for cleanup.
    pub selected: bool,
}

/// Result of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSummary {
    /// Ecosystem the scan ran against.
    pub ecosystem: Ecosystem,
    /// Number of units discovered, matched or not.
    pub total_scanned_count: usize,
    /// Number of units included in `entries`.
    pub total_count: usize,
    /// Combined size of all included units.
    pub total_size: u64,
    /// Included units ordered by relative path.
    pub entries: Vec<CleanupPreviewEntry>,
    /// Non-fatal problems encountered while walking the repository.
    #[serde(default)]
    pub warnings: Vec<ScanWarning>,
}

impl CleanupSummary {
    /// An empty summary for an ecosystem.
    pub fn empty(ecosystem: Ecosystem) -> Self {
        Self {
            ecosystem,
            total_scanned_count: 0,
            total_count: 0,
            total_size: 0,
            entries: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Entries currently selected for cleanup.
    pub fn selected(&self) -> impl Iterator<Item = &CleanupPreviewEntry> {
        self.entries.iter().filter(|e| e.selected)
    }

    /// Combined size of the selected entries.
    pub fn selected_size(&self) -> u64 {
        self.selected().map(|e| e.file_size).sum()
    }

    /// Number of entries with the given classification.
    pub fn count_of(&self, match_type: MatchType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.match_type == match_type)
            .count()
    }

    /// Select or deselect every entry.
    pub fn set_all_selected(&mut self, selected: bool) {
        for entry in &mut self.entries {
            entry.selected = selected;
        }
    }
}

/// Outcome of deleting one selected entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    /// Path that was cleaned.
    pub path: PathBuf,
    /// Display name of the cleaned unit.
    pub package_name: String,
    /// Classification the entry carried.
    pub match_type: MatchType,
    /// Whether everything targeted was removed.
    pub success: bool,
    /// Reason for failure.
    pub error_message: Option<String>,
}

impl CleanupResult {
    /// A successful cleanup of `entry`.
    pub fn succeeded(entry: &CleanupPreviewEntry) -> Self {
        Self {
            path: entry.path.clone(),
            package_name: entry.package_name.clone(),
            match_type: entry.match_type,
            success: true,
            error_message: None,
        }
    }

    /// A failed cleanup of `entry`.
    pub fn failed(entry: &CleanupPreviewEntry, message: impl Into<String>) -> Self {
        Self {
            path: entry.path.clone(),
            package_name: entry.package_name.clone(),
            match_type: entry.match_type,
            success: false,
            error_message: Some(message.into()),
        }
    }
}
