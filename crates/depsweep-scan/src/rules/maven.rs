//! Maven local repository rules (`~/.m2/repository`).

use std::path::Path;

use depsweep_core::{Ecosystem, PackageIdentity, PackageUnit};

use super::{EcosystemRules, coordinates, file_name};

const TARGET_SUFFIXES: &[&str] = &[".jar", ".pom", ".jar.lastUpdated", ".pom.lastUpdated"];

/// Rules for the `group/artifact/version` Maven layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct MavenRules;

impl EcosystemRules for MavenRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn should_exclude(&self, _dir: &Path) -> bool {
        false
    }

    fn is_target_file(&self, file: &Path) -> bool {
        file_name(file).is_some_and(|name| TARGET_SUFFIXES.iter().any(|s| name.ends_with(s)))
    }

    fn is_invalid_file(&self, file: &Path) -> bool {
        file_name(file).is_some_and(|name| name.ends_with(".lastUpdated"))
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
        unit.package_name(Ecosystem::Maven).starts_with(target)
    }
}
