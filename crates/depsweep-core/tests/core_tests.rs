use depsweep_core::{
    CleanupPreviewEntry, CleanupResult, CleanupSummary, Ecosystem, FilterOptions, MatchType,
    PackageIdentity, PackageUnit, ScanConfig,
};
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;
use tempfile::TempDir;

fn entry(relative: &str, match_type: MatchType, size: u64) -> CleanupPreviewEntry {
    CleanupPreviewEntry {
        path: PathBuf::from("/repo").join(relative),
        relative_path: relative.to_string(),
        package_name: relative.replace('/', ":"),
        match_type,
        file_size: size,
        last_modified: SystemTime::UNIX_EPOCH,
        selected: true,
    }
}

#[test]
fn test_summary_selection() {
    let mut summary = CleanupSummary::empty(Ecosystem::Maven);
    summary.entries = vec![
        entry("a/1.0", MatchType::Invalid, 10),
        entry("b/2.0-SNAPSHOT", MatchType::Snapshot, 20),
        entry("c/3.0-SNAPSHOT", MatchType::Snapshot, 30),
    ];

    assert_eq!(summary.selected_size(), 60);
    assert_eq!(summary.count_of(MatchType::Snapshot), 2);
    assert_eq!(summary.count_of(MatchType::Matched), 0);

    summary.entries[1].selected = false;
    assert_eq!(summary.selected().count(), 2);
    assert_eq!(summary.selected_size(), 40);

    summary.set_all_selected(false);
    assert_eq!(summary.selected().count(), 0);
}

#[test]
fn test_cleanup_result_constructors() {
    let e = entry("a/1.0", MatchType::Invalid, 10);

    let ok = CleanupResult::succeeded(&e);
    assert!(ok.success);
    assert!(ok.error_message.is_none());
    assert_eq!(ok.match_type, MatchType::Invalid);

    let failed = CleanupResult::failed(&e, "Permission denied");
    assert!(!failed.success);
    assert_eq!(failed.error_message.as_deref(), Some("Permission denied"));
    assert_eq!(failed.path, e.path);
}

#[test]
fn test_match_type_serializes_lowercase() {
    let json = serde_json::to_string(&MatchType::Native).unwrap();
    assert_eq!(json, "\"native\"");

    let parsed: MatchType = serde_json::from_str("\"snapshot\"").unwrap();
    assert_eq!(parsed, MatchType::Snapshot);
}

#[test]
fn test_filter_options_deserialize_partial() {
    let options: FilterOptions =
        serde_json::from_str(r#"{ "include_snapshot": true }"#).unwrap();
    assert!(options.include_snapshot);
    assert!(!options.show_invalid_packages);
    assert_eq!(options.target(), None);
    assert!(options.has_any_filter());
}

#[test]
fn test_scan_config_defaults() {
    let config = ScanConfig::new("/repo", Ecosystem::Gradle);
    assert_eq!(config.max_depth, depsweep_core::MAX_DIRECTORY_DEPTH);
    assert!(!config.filters.has_any_filter());

    let config = config.with_filters(FilterOptions {
        target_package: "com.google".to_string(),
        ..Default::default()
    });
    assert_eq!(config.filters.target(), Some("com.google"));
}

#[test]
fn test_unit_keeps_identity() {
    let unit = PackageUnit::new(
        "node_modules/@types/node",
        "/p/node_modules/@types/node",
        PackageIdentity::new("@types/node", "20.1.0"),
    );
    assert_eq!(unit.package_name(Ecosystem::Npm), "@types/node@20.1.0");
    assert_eq!(unit.dir_name(), "node");
}

#[test]
fn test_detect_ecosystem() {
    let temp = TempDir::new().unwrap();
    assert_eq!(Ecosystem::detect(temp.path()), None);

    fs::write(temp.path().join("pyproject.toml"), "[project]\n").unwrap();
    assert_eq!(Ecosystem::detect(temp.path()), Some(Ecosystem::Pip));

    fs::write(temp.path().join("package.json"), "{}").unwrap();
    assert_eq!(Ecosystem::detect(temp.path()), Some(Ecosystem::Npm));

    fs::write(temp.path().join("build.gradle.kts"), "").unwrap();
    assert_eq!(Ecosystem::detect(temp.path()), Some(Ecosystem::Gradle));

    fs::write(temp.path().join("pom.xml"), "<project/>").unwrap();
    assert_eq!(Ecosystem::detect(temp.path()), Some(Ecosystem::Maven));
}
