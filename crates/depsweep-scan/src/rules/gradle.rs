//! Gradle dependency cache rules (`caches/modules-2/files-2.1`).

use std::path::{Path, PathBuf};

use depsweep_core::{Ecosystem, PackageIdentity, PackageUnit};

use super::{EcosystemRules, coordinates, file_name, is_hex_digest, parent_name};

const TARGET_SUFFIXES: &[&str] = &[".jar", ".pom", ".module", ".aar"];
const INVALID_SUFFIXES: &[&str] = &[".part", ".lastUpdated"];

/// Gradle strips leading zeros from SHA-1 checksum directory names.
const CHECKSUM_MIN_LEN: usize = 30;

/// Rules for Gradle's `group/artifact/version/<checksum>/file` layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct GradleRules;

/// `metadata-2.106`, `transforms-3` and friends.
fn is_versioned_internal(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

impl EcosystemRules for GradleRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Gradle
    }

    fn should_exclude(&self, dir: &Path) -> bool {
        let Some(name) = file_name(dir) else {
            return false;
        };
        if is_versioned_internal(name, "metadata") || is_versioned_internal(name, "transforms") {
            return true;
        }
        // A bare name is only cache-internal at the cache level, not as an artifact id.
        matches!(name, "metadata" | "transforms")
            && matches!(parent_name(dir), Some("modules-2" | "caches"))
    }

    fn is_target_file(&self, file: &Path) -> bool {
        file_name(file).is_some_and(|name| TARGET_SUFFIXES.iter().any(|s| name.ends_with(s)))
    }

    fn is_invalid_file(&self, file: &Path) -> bool {
        file_name(file).is_some_and(|name| INVALID_SUFFIXES.iter().any(|s| name.ends_with(s)))
    }

    fn unit_dir(&self, file: &Path) -> Option<PathBuf> {
        let parent = file.parent()?;
        match file_name(parent) {
            Some(name) if is_hex_digest(name, CHECKSUM_MIN_LEN) => {
                parent.parent().map(Path::to_path_buf)
            }
            _ => Some(parent.to_path_buf()),
        }
    }

    fn identify(&self, root: &Path, file: &Path) -> PackageIdentity {
        match self.unit_dir(file) {
            Some(dir) => coordinates(root, &dir),
            None => PackageIdentity::unknown(),
        }
    }

    fn is_snapshot(&self, unit: &PackageUnit) -> bool {
        unit.version.ends_with("SNAPSHOT")
    }

    fn is_native(&self, _unit: &PackageUnit) -> bool {
        false
    }

    fn matches_target(&self, unit: &PackageUnit, target: &str) -> bool {
        unit.package_name(Ecosystem::Gradle).starts_with(target)
    }
}
