//! Per-ecosystem knowledge: which directories to skip, which files mark a
//! package, how a unit is named and how it is classified.

mod gradle;
mod maven;
mod npm;
mod pip;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use depsweep_core::{Ecosystem, PackageIdentity, PackageUnit, ScanConfig};

pub use gradle::GradleRules;
pub use maven::MavenRules;
pub use npm::NpmRules;
pub use pip::PipRules;

/// Ecosystem-specific rules consulted by the walker, the unit registry and
/// the classifier.
///
/// Every predicate must be a pure function of the path (plus, at most, a
/// cheap look at the filesystem around it). The walker calls
/// [`should_exclude`](Self::should_exclude) from inside jwalk, so rules
/// are shared behind an `Arc` and must be `Send + Sync`.
pub trait EcosystemRules: Send + Sync + fmt::Debug {
    /// The ecosystem these rules describe.
    fn ecosystem(&self) -> Ecosystem;

    /// Whether the walker must not descend into `dir`.
    fn should_exclude(&self, dir: &Path) -> bool;

    /// Whether `file` marks a package artifact.
    fn is_target_file(&self, file: &Path) -> bool;

    /// Whether `file` marks a failed or incomplete download.
    fn is_invalid_file(&self, file: &Path) -> bool;

    /// Directory that represents the unit owning `file`.
    fn unit_dir(&self, file: &Path) -> Option<PathBuf> {
        file.parent().map(Path::to_path_buf)
    }

    /// Derive the (name, version) identity of the unit owning `file`.
    ///
    /// Never fails: when nothing can be parsed the identity falls back to
    /// [`PackageIdentity::unknown`].
    fn identify(&self, root: &Path, file: &Path) -> PackageIdentity;

    /// Whether the unit is a snapshot or prerelease version.
    fn is_snapshot(&self, unit: &PackageUnit) -> bool;

    /// Whether the unit is a platform-specific native binary package.
    fn is_native(&self, unit: &PackageUnit) -> bool;

    /// Whether the unit matches a user-supplied target (already trimmed).
    fn matches_target(&self, unit: &PackageUnit, target: &str) -> bool;
}

/// Default rules for an ecosystem.
pub fn rules_for(ecosystem: Ecosystem) -> Arc<dyn EcosystemRules> {
    match ecosystem {
        Ecosystem::Maven => Arc::new(MavenRules),
        Ecosystem::Gradle => Arc::new(GradleRules),
        Ecosystem::Npm => Arc::new(NpmRules),
        Ecosystem::Pip => Arc::new(PipRules::default()),
    }
}

/// Rules for a scan configuration, honoring ecosystem-specific switches.
pub fn rules_for_config(config: &ScanConfig) -> Arc<dyn EcosystemRules> {
    match config.ecosystem {
        Ecosystem::Pip => Arc::new(PipRules::new(config.skip_foreign_installers)),
        other => rules_for(other),
    }
}

/// `/`-joined path of `dir` relative to `root`.
///
/// Returns `None` when `dir` is not under `root` and an empty string for
/// the root itself.
pub fn relative_key(root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(segments.join("/"))
}

/// Final path component as UTF-8.
pub(crate) fn file_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

/// Name of the parent directory.
pub(crate) fn parent_name(path: &Path) -> Option<&str> {
    file_name(path.parent()?)
}

/// Path segments of `dir` below `root`.
pub(crate) fn segments_below(root: &Path, dir: &Path) -> Vec<String> {
    dir.strip_prefix(root)
        .map(|relative| {
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Whether any component of `path` equals `segment`.
pub(crate) fn has_segment(path: &Path, segment: &str) -> bool {
    path.iter().any(|s| s == segment)
}

/// Whether `path` itself is a symbolic link. Errors count as "no".
pub(crate) fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Whether `name` looks like a lowercase hex digest of at least `min_len`
/// characters.
pub(crate) fn is_hex_digest(name: &str, min_len: usize) -> bool {
    name.len() >= min_len && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Maven-layout coordinates shared by Maven and Gradle.
///
/// Three or more segments read as `group/.../artifact/version`; two read as
/// `name/version`; anything shorter keeps only the directory name.
pub(crate) fn coordinates(root: &Path, unit_dir: &Path) -> PackageIdentity {
    let segments = segments_below(root, unit_dir);
    match segments.as_slice() {
        [] => PackageIdentity::unknown(),
        [version] => PackageIdentity::new(depsweep_core::UNKNOWN, version.as_str()),
        [name, version] => PackageIdentity::new(name.as_str(), version.as_str()),
        [group @ .., artifact, version] => PackageIdentity::new(
            format!("{}:{}", group.join("."), artifact),
            version.as_str(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_key() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_key(root, Path::new("/repo/com/acme/lib/1.0")).as_deref(),
            Some("com/acme/lib/1.0")
        );
        assert_eq!(relative_key(root, root).as_deref(), Some(""));
        assert_eq!(relative_key(root, Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn test_coordinates() {
        let root = Path::new("/repo");
        let id = coordinates(root, Path::new("/repo/org/apache/commons/commons-lang3/3.12.0"));
        assert_eq!(id.name, "org.apache.commons:commons-lang3");
        assert_eq!(id.version, "3.12.0");

        let id = coordinates(root, Path::new("/repo/lib/1.0"));
        assert_eq!(id.name, "lib");
        assert_eq!(id.version, "1.0");

        let id = coordinates(root, Path::new("/repo/1.0"));
        assert_eq!(id.name, "unknown");
        assert_eq!(id.version, "1.0");
    }

    #[test]
    fn test_hex_digest() {
        assert!(is_hex_digest("3f1a0c9b2d7e4f5a6b8c9d0e1f2a3b4c5d6e7f80", 30));
        assert!(!is_hex_digest("3f1a0c", 30));
        assert!(!is_hex_digest("not-a-digest-at-all-but-long-enough", 30));
    }

    #[test]
    fn test_rules_for_config() {
        for ecosystem in [Ecosystem::Maven, Ecosystem::Gradle, Ecosystem::Npm, Ecosystem::Pip] {
            let config = ScanConfig::new("/repo", ecosystem);
            assert_eq!(rules_for_config(&config).ecosystem(), ecosystem);
        }
    }
}
