//! Assigns a [`MatchType`] to each unit.

use depsweep_core::{FilterOptions, MatchType, PackageUnit};

use crate::rules::EcosystemRules;

/// Outcome of classifying one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub match_type: MatchType,
    pub include: bool,
}

/// Classify a unit against the selected filters.
///
/// The first applicable classification wins, in this order: invalid,
/// matched, native, snapshot. Each is only considered when its filter is
/// enabled. Units nothing applies to are `Unknown` and excluded.
pub fn classify(
    rules: &dyn EcosystemRules,
    unit: &PackageUnit,
    options: &FilterOptions,
) -> Classification {
    let match_type = if options.show_invalid_packages && unit.invalid {
        MatchType::Invalid
    } else if options
        .target()
        .is_some_and(|target| rules.matches_target(unit, target))
    {
        MatchType::Matched
    } else if options.show_platform_specific_binaries && rules.is_native(unit) {
        MatchType::Native
    } else if options.include_snapshot && rules.is_snapshot(unit) {
        MatchType::Snapshot
    } else {
        MatchType::Unknown
    };

    Classification {
        match_type,
        include: match_type.is_included(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{MavenRules, NpmRules};
    use depsweep_core::PackageIdentity;

    fn maven_unit(name: &str, version: &str, invalid: bool) -> PackageUnit {
        let mut unit = PackageUnit::new("x", "/r/x", PackageIdentity::new(name, version));
        if invalid {
            unit.mark_invalid();
        }
        unit
    }

    fn options(snapshot: bool, invalid: bool, native: bool, target: &str) -> FilterOptions {
        FilterOptions {
            include_snapshot: snapshot,
            show_invalid_packages: invalid,
            show_platform_specific_binaries: native,
            target_package: target.to_string(),
        }
    }

    #[test]
    fn test_invalid_takes_precedence() {
        let unit = maven_unit("com.acme:lib", "1.0-SNAPSHOT", true);
        let c = classify(&MavenRules, &unit, &options(true, true, false, "com.acme"));
        assert_eq!(c.match_type, MatchType::Invalid);
        assert!(c.include);
    }

    #[test]
    fn test_disabled_filters_do_not_apply() {
        let unit = maven_unit("com.acme:lib", "1.0-SNAPSHOT", true);
        let c = classify(&MavenRules, &unit, &options(false, false, false, "org.other"));
        assert_eq!(c.match_type, MatchType::Unknown);
        assert!(!c.include);

        let c = classify(&MavenRules, &unit, &options(true, false, false, ""));
        assert_eq!(c.match_type, MatchType::Snapshot);
    }

    #[test]
    fn test_matched_before_snapshot() {
        let unit = maven_unit("com.acme:lib", "1.0-SNAPSHOT", false);
        let c = classify(&MavenRules, &unit, &options(true, false, false, "  com.acme  "));
        assert_eq!(c.match_type, MatchType::Matched);
    }

    #[test]
    fn test_native_before_snapshot() {
        let unit = PackageUnit::new(
            "node_modules/esbuild/linux-x64",
            "/p/node_modules/esbuild/linux-x64",
            PackageIdentity::new("esbuild", "0.19.0-beta.1"),
        );
        let c = classify(&NpmRules, &unit, &options(true, false, true, ""));
        assert_eq!(c.match_type, MatchType::Native);

        let c = classify(&NpmRules, &unit, &options(true, false, false, ""));
        assert_eq!(c.match_type, MatchType::Snapshot);
    }
}
