use std::fs;
use std::path::Path;

use depsweep_scan::{
    CacheScanner, Ecosystem, FilterOptions, MatchType, ScanConfig, ScanError, ScanObserver, scan,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn filters(snapshot: bool, invalid: bool, native: bool, target: &str) -> FilterOptions {
    FilterOptions {
        include_snapshot: snapshot,
        show_invalid_packages: invalid,
        show_platform_specific_binaries: native,
        target_package: target.to_string(),
    }
}

fn scan_with(root: &Path, ecosystem: Ecosystem, options: FilterOptions) -> depsweep_scan::CleanupSummary {
    scan(&ScanConfig::new(root, ecosystem).with_filters(options)).unwrap()
}

#[derive(Default)]
struct Recorder {
    directories: u64,
    classified: Vec<(usize, usize)>,
}

impl ScanObserver for Recorder {
    fn on_directory_visited(&mut self, directories_visited: u64) {
        self.directories = directories_visited;
    }

    fn on_unit_classified(&mut self, processed: usize, total: usize) {
        self.classified.push((processed, total));
    }
}

#[test]
fn test_maven_snapshot_scan() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "com/acme/lib/1.0-SNAPSHOT/lib-1.0-SNAPSHOT.jar", "snapshot jar");
    write(temp.path(), "com/acme/lib/1.0/lib-1.0.jar", "release jar");

    let summary = scan_with(temp.path(), Ecosystem::Maven, filters(true, false, false, ""));

    assert_eq!(summary.total_scanned_count, 2);
    assert_eq!(summary.total_count, 1);
    let entry = &summary.entries[0];
    assert_eq!(entry.match_type, MatchType::Snapshot);
    assert_eq!(entry.relative_path, "com/acme/lib/1.0-SNAPSHOT");
    assert_eq!(entry.package_name, "com.acme:lib:1.0-SNAPSHOT");
    assert_eq!(entry.file_size, 12);
    assert!(entry.selected);
}

#[test]
fn test_maven_invalid_scan() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "org/x/y/2.0/y-2.0.jar.lastUpdated", "");
    write(temp.path(), "org/x/y/3.0/y-3.0.jar", "ok");

    let summary = scan_with(temp.path(), Ecosystem::Maven, filters(false, true, false, ""));

    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.entries[0].match_type, MatchType::Invalid);
    assert_eq!(summary.entries[0].package_name, "org.x:y:2.0");
}

#[test]
fn test_jar_and_pom_are_one_unit() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "com/acme/lib/1.0/lib-1.0.jar", "jar");
    write(temp.path(), "com/acme/lib/1.0/lib-1.0.pom", "pom");

    let summary = scan_with(temp.path(), Ecosystem::Maven, filters(false, false, false, "com.acme"));

    assert_eq!(summary.total_scanned_count, 1);
    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.entries[0].match_type, MatchType::Matched);
    assert_eq!(summary.total_size, 6);
}

#[test]
fn test_invalid_wins_over_snapshot_and_target() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "com/acme/lib/1.0-SNAPSHOT/lib-1.0-SNAPSHOT.pom", "pom");
    write(temp.path(), "com/acme/lib/1.0-SNAPSHOT/lib-1.0-SNAPSHOT.jar.lastUpdated", "");

    let summary = scan_with(temp.path(), Ecosystem::Maven, filters(true, true, true, "com.acme"));

    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.entries[0].match_type, MatchType::Invalid);
}

#[test]
fn test_gradle_checksum_dirs_collapse() {
    let temp = TempDir::new().unwrap();
    let sha1 = "0a1b2c3d4e5f60718293a4b5c6d7e8f901234567";
    let sha2 = "fedcba98765432100123456789abcdef01234567";
    write(temp.path(), &format!("com.acme/lib/1.0-SNAPSHOT/{sha1}/lib-1.0-SNAPSHOT.jar"), "j");
    write(temp.path(), &format!("com.acme/lib/1.0-SNAPSHOT/{sha2}/lib-1.0-SNAPSHOT.pom"), "p");
    write(temp.path(), "modules-2/metadata-2.106/descriptors/x/y.jar", "ignored");

    let summary = scan_with(temp.path(), Ecosystem::Gradle, filters(true, false, false, ""));

    assert_eq!(summary.total_scanned_count, 1);
    assert_eq!(summary.entries[0].package_name, "com.acme:lib:1.0-SNAPSHOT");
    assert_eq!(summary.entries[0].file_size, 2);
}

#[test]
fn test_npm_target_match() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "node_modules/react/package.json",
        r#"{"name":"react","version":"18.2.0"}"#,
    );
    write(temp.path(), "node_modules/react/cjs/package.json", r#"{"type":"commonjs"}"#);
    write(
        temp.path(),
        "node_modules/react-dom/package.json",
        r#"{"name":"react-dom","version":"18.2.0"}"#,
    );

    let summary = scan_with(temp.path(), Ecosystem::Npm, filters(false, false, false, "react"));

    assert_eq!(summary.total_scanned_count, 2);
    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.entries[0].relative_path, "node_modules/react");
    assert_eq!(summary.entries[0].package_name, "react@18.2.0");
    assert_eq!(summary.entries[0].match_type, MatchType::Matched);
}

#[test]
fn test_npm_package_archives_stay_in_their_package() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "node_modules/foo/package.json",
        r#"{"name":"foo","version":"1.0.0"}"#,
    );
    write(temp.path(), "node_modules/foo/fixtures/data.zip", "zip-bytes");
    write(temp.path(), "node_modules/foo/vendor/bar-2.0.0.tgz", "tgz");

    let summary = scan_with(temp.path(), Ecosystem::Npm, filters(false, false, false, "foo"));

    assert_eq!(summary.total_scanned_count, 1);
    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.entries[0].relative_path, "node_modules/foo");
    assert_eq!(summary.entries[0].package_name, "foo@1.0.0");
    assert_eq!(summary.total_size, summary.entries[0].file_size);
}

#[test]
fn test_npm_native_and_prerelease() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "node_modules/@esbuild/linux-x64/package.json",
        r#"{"name":"@esbuild/linux-x64","version":"0.19.0"}"#,
    );
    write(
        temp.path(),
        "node_modules/next/package.json",
        r#"{"name":"next","version":"14.1.0-canary.12"}"#,
    );
    write(
        temp.path(),
        "node_modules/lodash/package.json",
        r#"{"name":"lodash","version":"4.17.21"}"#,
    );

    let summary = scan_with(temp.path(), Ecosystem::Npm, filters(true, false, true, ""));

    assert_eq!(summary.total_scanned_count, 3);
    assert_eq!(summary.total_count, 2);
    assert_eq!(summary.count_of(MatchType::Native), 1);
    assert_eq!(summary.count_of(MatchType::Snapshot), 1);
    assert_eq!(summary.entries[0].package_name, "@esbuild/linux-x64@0.19.0");
}

#[test]
fn test_npm_cache_tarballs() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "pkgs/lodash-4.17.21.tgz", "tgz");
    write(temp.path(), "partial/left-pad-1.3.0.tgz.tmp", "");
    write(temp.path(), "pkgs/docs/readme-1.0.0.tgz", "skipped");

    let summary = scan_with(temp.path(), Ecosystem::Npm, filters(false, true, false, "lodash"));

    assert_eq!(summary.total_scanned_count, 2);
    let names: Vec<_> = summary.entries.iter().map(|e| e.package_name.as_str()).collect();
    assert_eq!(names, ["left-pad@1.3.0", "lodash@4.17.21"]);
    assert_eq!(summary.entries[0].match_type, MatchType::Invalid);
}

#[test]
fn test_pip_names_are_normalized() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "site-packages/Flask_Login-0.6.2.dist-info/METADATA", "Name: Flask-Login\n");
    write(temp.path(), "site-packages/Flask_Login-0.6.2.dist-info/RECORD", "");
    write(temp.path(), "site-packages/requests-2.31.0.dist-info/METADATA", "Name: requests\n");

    let summary = scan_with(temp.path(), Ecosystem::Pip, filters(false, false, false, "flask-login"));

    assert_eq!(summary.total_scanned_count, 2);
    assert_eq!(summary.total_count, 1);
    assert_eq!(summary.entries[0].package_name, "flask-login@0.6.2");
    assert_eq!(
        summary.entries[0].relative_path,
        "site-packages/Flask_Login-0.6.2.dist-info"
    );
}

#[test]
fn test_pip_cache_archives() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "wheels/ab/cd/numpy-1.26.0rc1-cp311-cp311-win_amd64.whl", "w");
    write(temp.path(), "wheels/ef/gh/requests-2.31.0-py3-none-any.whl", "w");
    write(temp.path(), "http-v2/0/1/2/opaque-blob", "blob");

    let summary = scan_with(temp.path(), Ecosystem::Pip, filters(true, false, true, ""));

    assert_eq!(summary.total_scanned_count, 2);
    assert_eq!(summary.total_count, 1);
    let entry = &summary.entries[0];
    assert_eq!(entry.match_type, MatchType::Native);
    assert_eq!(entry.package_name, "numpy@1.26.0rc1 (cp311-win_amd64)");
}

#[test]
fn test_no_filter_makes_no_callbacks() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "com/acme/lib/1.0/lib-1.0.jar", "jar");

    let scanner = CacheScanner::from_config(&ScanConfig::new(temp.path(), Ecosystem::Maven));
    let mut recorder = Recorder::default();
    let result = scanner.scan_with(temp.path(), &FilterOptions::default(), &mut recorder);

    assert!(matches!(result, Err(ScanError::NoFilterSelected)));
    assert_eq!(recorder.directories, 0);
    assert!(recorder.classified.is_empty());

    let blank_target = filters(false, false, false, "   ");
    let result = scanner.scan_with(temp.path(), &blank_target, &mut recorder);
    assert!(matches!(result, Err(ScanError::NoFilterSelected)));
}

#[test]
fn test_observer_sees_every_directory_and_unit() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "com/acme/a/1.0/a-1.0.jar", "");
    write(temp.path(), "com/acme/b/1.0/b-1.0.jar", "");

    let scanner = CacheScanner::from_config(&ScanConfig::new(temp.path(), Ecosystem::Maven));
    let mut recorder = Recorder::default();
    scanner
        .scan_with(temp.path(), &filters(true, false, false, ""), &mut recorder)
        .unwrap();

    // com, acme, a, a/1.0, b, b/1.0
    assert_eq!(recorder.directories, 6);
    assert_eq!(recorder.classified, vec![(1, 2), (2, 2)]);
}

#[test]
fn test_scan_is_idempotent() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "com/acme/lib/1.0-SNAPSHOT/lib-1.0-SNAPSHOT.jar", "a");
    write(temp.path(), "com/acme/lib/2.0-SNAPSHOT/lib-2.0-SNAPSHOT.jar", "bb");
    write(temp.path(), "org/other/tool/0.1-SNAPSHOT/tool.pom", "ccc");

    let options = filters(true, false, false, "");
    let first = scan_with(temp.path(), Ecosystem::Maven, options.clone());
    let second = scan_with(temp.path(), Ecosystem::Maven, options);

    assert_eq!(first.entries, second.entries);
    assert_eq!(first.total_size, second.total_size);
    assert_eq!(first.total_scanned_count, 3);
}

#[test]
fn test_depth_bound_limits_discovery() {
    let temp = TempDir::new().unwrap();
    let mut relative = String::new();
    for level in 1..=25 {
        relative.push_str(&format!("d{level}/"));
        write(temp.path(), &format!("{relative}pkg-1.0-SNAPSHOT.jar"), "x");
    }

    let summary = scan_with(temp.path(), Ecosystem::Maven, filters(true, false, false, ""));

    // Files live at depth 2..=26; only those at depth 20 or less are seen.
    assert_eq!(summary.total_scanned_count, 19);
    assert!(summary.entries.iter().all(|e| e.relative_path.split('/').count() <= 19));
}
