//! Package units and their classification labels.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::ecosystem::Ecosystem;

/// Placeholder used when a name or version cannot be derived.
pub const UNKNOWN: &str = "unknown";

/// The (name, version) identity derived for a unit by an ecosystem identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Canonical, ecosystem-normalized package name.
    pub name: CompactString,
    /// Version string as found on disk.
    pub version: CompactString,
    /// Optional display suffix such as a platform triplet.
    pub qualifier: Option<CompactString>,
}

impl PackageIdentity {
    /// Create an identity from a name and version.
    pub fn new(name: impl Into<CompactString>, version: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            qualifier: None,
        }
    }

    /// Identity used when nothing could be parsed.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    /// Identity with a known name but no parseable version.
    pub fn unversioned(name: impl Into<CompactString>) -> Self {
        Self::new(name, UNKNOWN)
    }

    /// Attach a display qualifier.
    pub fn with_qualifier(mut self, qualifier: impl Into<CompactString>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

/// One logical package version discovered in a repository.
///
/// Units are keyed by `relative_path`. Once created, the name and version
/// never change; `invalid` can only go from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUnit {
    /// Unit directory relative to the repository root, `/`-separated.
    pub relative_path: String,
    /// Canonical package name.
    pub canonical_name: CompactString,
    /// Package version.
    pub version: CompactString,
    /// Absolute path of the unit directory.
    pub directory: PathBuf,
    /// Whether a failed or incomplete download marker was seen.
    pub invalid: bool,
    /// Optional display suffix (never used for matching).
    pub qualifier: Option<CompactString>,
}

impl PackageUnit {
    /// Create a valid unit from an identity.
    pub fn new(
        relative_path: impl Into<String>,
        directory: impl Into<PathBuf>,
        identity: PackageIdentity,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            canonical_name: identity.name,
            version: identity.version,
            directory: directory.into(),
            invalid: false,
            qualifier: identity.qualifier,
        }
    }

    /// Flag the unit as invalid. There is no way to clear the flag.
    pub fn mark_invalid(&mut self) {
        self.invalid = true;
    }

    /// Name of the unit directory itself.
    pub fn dir_name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Display name, e.g. `com.acme:lib:1.0` or `react@18.2.0 (linux-x64)`.
    pub fn package_name(&self, ecosystem: Ecosystem) -> String {
        let mut name = format!(
            "{}{}{}",
            self.canonical_name,
            ecosystem.separator(),
            self.version
        );
        if let Some(qualifier) = &self.qualifier {
            name.push_str(&format!(" ({qualifier})"));
        }
        name
    }
}

/// Classification assigned to a unit for one scan.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchType {
    /// Name matched the requested target package.
    Matched,
    /// Snapshot or prerelease version.
    Snapshot,
    /// Failed or incomplete download.
    Invalid,
    /// Platform-specific native binary package.
    Native,
    /// Nothing requested applies; never reported.
    Unknown,
}

impl MatchType {
    /// Whether units with this classification belong in a report.
    pub fn is_included(self) -> bool {
        self != Self::Unknown
    }

    /// Label shown to users, following each ecosystem's vocabulary.
    pub fn label(self, ecosystem: Ecosystem) -> &'static str {
        match (self, ecosystem) {
            (Self::Snapshot, Ecosystem::Npm | Ecosystem::Pip) => "prerelease",
            (Self::Native, Ecosystem::Pip) => "platform",
            (Self::Matched, _) => "matched",
            (Self::Snapshot, _) => "snapshot",
            (Self::Invalid, _) => "invalid",
            (Self::Native, _) => "native",
            (Self::Unknown, _) => "unknown",
        }
    }
}
