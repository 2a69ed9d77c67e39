//! Groups relevant files into package units.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use depsweep_core::PackageUnit;

use crate::rules::{EcosystemRules, relative_key};

/// Collects one [`PackageUnit`] per unit directory.
///
/// The first relevant file seen for a directory fixes the unit's identity.
/// Later files only contribute their invalid marker, which is never cleared.
#[derive(Debug)]
pub struct UnitRegistry<'a> {
    root: PathBuf,
    rules: &'a dyn EcosystemRules,
    units: BTreeMap<String, PackageUnit>,
}

impl<'a> UnitRegistry<'a> {
    pub fn new(root: impl Into<PathBuf>, rules: &'a dyn EcosystemRules) -> Self {
        Self {
            root: root.into(),
            rules,
            units: BTreeMap::new(),
        }
    }

    /// Offer a file to the registry.
    ///
    /// Returns `true` when the file was relevant and attributed to a unit.
    pub fn register(&mut self, file: &Path) -> bool {
        let invalid = self.rules.is_invalid_file(file);
        if !invalid && !self.rules.is_target_file(file) {
            return false;
        }
        let Some(unit_dir) = self.rules.unit_dir(file) else {
            return false;
        };
        let key = match relative_key(&self.root, &unit_dir) {
            Some(key) if !key.is_empty() => key,
            _ => return false,
        };

        let rules = self.rules;
        let root = &self.root;
        let unit = self.units.entry(key).or_insert_with_key(|key| {
            let identity = rules.identify(root, file);
            tracing::debug!("New unit {} ({}@{})", key, identity.name, identity.version);
            PackageUnit::new(key.clone(), unit_dir, identity)
        });
        if invalid {
            unit.mark_invalid();
        }
        true
    }

    /// Number of distinct units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Look up a unit by its relative path.
    pub fn get(&self, relative_path: &str) -> Option<&PackageUnit> {
        self.units.get(relative_path)
    }

    /// Units ordered by relative path.
    pub fn units(&self) -> impl Iterator<Item = &PackageUnit> {
        self.units.values()
    }

    pub fn into_units(self) -> Vec<PackageUnit> {
        self.units.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{MavenRules, PipRules};

    #[test]
    fn test_jar_and_pom_share_a_unit() {
        let rules = MavenRules;
        let mut registry = UnitRegistry::new("/r", &rules);
        assert!(registry.register(Path::new("/r/com/acme/lib/1.0/lib-1.0.jar")));
        assert!(registry.register(Path::new("/r/com/acme/lib/1.0/lib-1.0.pom")));
        assert!(!registry.register(Path::new("/r/com/acme/lib/1.0/lib-1.0.jar.sha1")));

        assert_eq!(registry.len(), 1);
        let unit = registry.get("com/acme/lib/1.0").unwrap();
        assert_eq!(unit.canonical_name, "com.acme:lib");
        assert!(!unit.invalid);
    }

    #[test]
    fn test_invalid_marker_is_sticky() {
        let rules = MavenRules;
        let mut registry = UnitRegistry::new("/r", &rules);
        registry.register(Path::new("/r/com/acme/lib/1.0/lib-1.0.jar.lastUpdated"));
        registry.register(Path::new("/r/com/acme/lib/1.0/lib-1.0.pom"));

        assert!(registry.get("com/acme/lib/1.0").unwrap().invalid);
    }

    #[test]
    fn test_files_at_root_are_ignored() {
        let rules = MavenRules;
        let mut registry = UnitRegistry::new("/r", &rules);
        assert!(!registry.register(Path::new("/r/stray.jar")));
        assert!(!registry.register(Path::new("/elsewhere/a/b.jar")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_units_are_ordered() {
        let rules = PipRules::default();
        let mut registry = UnitRegistry::new("/r", &rules);
        registry.register(Path::new("/r/z/zeta-1.0.tar.gz"));
        registry.register(Path::new("/r/a/alpha-1.0.tar.gz"));

        let paths: Vec<_> = registry.units().map(|u| u.relative_path.as_str()).collect();
        assert_eq!(paths, ["a", "z"]);
    }
}
