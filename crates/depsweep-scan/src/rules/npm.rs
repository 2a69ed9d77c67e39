//! npm, Yarn and pnpm rules: project `node_modules` trees and package caches.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use depsweep_core::{Ecosystem, PackageIdentity, PackageUnit};

use super::{EcosystemRules, file_name, has_segment, is_symlink, parent_name};

static PLATFORM_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(win32|darwin|linux)-(x64|arm64|ia32)$").unwrap());

static PRERELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\.\d+\.\d+-(alpha|beta|rc|dev|next|canary|experimental|snapshot|preview)")
        .unwrap()
});

static TARBALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>.+?)-(?P<version>\d+\.\d+\.\d+(?:-[0-9A-Za-z.]+)?)(?:-(?P<platform>(?:win32|darwin|linux|freebsd|android)-(?:x64|arm64|ia32|arm)))?\.tgz$",
    )
    .unwrap()
});

static BERRY_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+?)-npm-(?P<version>\d+\.\d+\.\d+[0-9A-Za-z.+-]*?)-[0-9a-f]+(?:-[0-9a-f]+)?\.zip$")
        .unwrap()
});

static SIMPLE_ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>.+?)-(?P<version>\d+\.\d+\.\d+.*?)\.zip$").unwrap());

static CONTENT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40,128}(?:-exec)?$").unwrap());

/// Directory names that never hold installable packages.
const NOISE_DIRS: &[&str] = &["examples", "docs", "test", "tests", "__tests__", "coverage"];

/// Hidden directories that still hold packages.
const KEPT_DOT_DIRS: &[&str] = &[".pnpm", ".yarn"];

/// Markers left behind by interrupted downloads.
const PARTIAL_SUFFIXES: &[&str] = &[".tgz.tmp", ".tgz.downloading", ".incomplete"];

#[derive(Debug, Deserialize)]
struct Manifest {
    name: Option<String>,
    version: Option<String>,
}

fn read_manifest(path: &Path) -> Option<Manifest> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            tracing::debug!("Unreadable manifest {}: {}", path.display(), err);
            None
        }
    }
}

/// Rules for npm-style caches and `node_modules` trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct NpmRules;

/// Whether `dir` lies inside (or is) a content cache store, where only
/// noise directories are skipped.
fn in_cache_store(dir: &Path) -> bool {
    let segments: Vec<&OsStr> = dir.iter().collect();
    segments.iter().any(|s| {
        *s == "_cacache" || *s == "npm-cache" || *s == ".pnpm-store"
    }) || segments
        .windows(2)
        .any(|w| (w[0] == "Yarn" && w[1] == "Cache") || (w[0] == ".yarn" && w[1] == "cache"))
}

/// Whether a linked directory resolves into a pnpm virtual store, where
/// the walker will find the real copy.
fn links_into_pnpm_store(dir: &Path) -> bool {
    fs::canonicalize(dir)
        .map(|target| has_segment(&target, ".pnpm"))
        .unwrap_or(false)
}

/// Locate the package owning `path` inside the last `node_modules` segment.
///
/// Returns the package name (scoped names span two segments) and the
/// package root directory. `path` must have at least one segment below the
/// package root.
fn node_modules_package(path: &Path) -> Option<(String, PathBuf)> {
    let parts: Vec<&OsStr> = path.iter().collect();
    let last = parts.len().checked_sub(1)?;
    let nm = parts[..last].iter().rposition(|p| *p == "node_modules")?;
    if nm + 1 >= last {
        return None;
    }
    let first = parts[nm + 1].to_str()?;
    if first.starts_with('@') {
        if nm + 2 >= last {
            return None;
        }
        let second = parts[nm + 2].to_str()?;
        Some((format!("{first}/{second}"), parts[..=nm + 2].iter().collect()))
    } else {
        Some((first.to_string(), parts[..=nm + 1].iter().collect()))
    }
}

/// Parse a pnpm virtual store entry such as `react@18.2.0` or
/// `@babel+core@7.22.0_supports-color@5.5.0`.
fn parse_pnpm_entry(entry: &str) -> Option<PackageIdentity> {
    let (name, rest) = match entry.strip_prefix('@') {
        Some(scoped) => {
            let (scope, rest) = scoped.split_once('+')?;
            let (name, version) = rest.split_once('@')?;
            (format!("@{scope}/{name}"), version)
        }
        None => {
            let (name, version) = entry.split_once('@')?;
            (name.to_string(), version)
        }
    };
    let version = rest.split(['_', '(']).next().unwrap_or(rest);
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some(PackageIdentity::new(name, version))
}

/// Identity from the `.pnpm/<entry>/...` segment of `path`.
fn pnpm_identity(path: &Path) -> Option<PackageIdentity> {
    let parts: Vec<&OsStr> = path.iter().collect();
    let idx = parts.iter().position(|p| *p == ".pnpm")?;
    // The entry must be a directory, not the file itself.
    if idx + 2 >= parts.len() {
        return None;
    }
    parse_pnpm_entry(parts[idx + 1].to_str()?)
}

fn parse_tarball(name: &str) -> Option<PackageIdentity> {
    let caps = TARBALL.captures(name)?;
    let identity = PackageIdentity::new(&caps["name"], &caps["version"]);
    Some(match caps.name("platform") {
        Some(platform) => identity.with_qualifier(platform.as_str()),
        None => identity,
    })
}

/// Yarn Berry stores `@scope/name` as `@scope-name`.
fn decode_berry_name(name: &str) -> String {
    match name.strip_prefix('@').and_then(|rest| rest.split_once('-')) {
        Some((scope, rest)) => format!("@{scope}/{rest}"),
        None => name.to_string(),
    }
}

fn parse_zip(name: &str) -> Option<PackageIdentity> {
    if let Some(caps) = BERRY_ZIP.captures(name) {
        return Some(PackageIdentity::new(
            decode_berry_name(&caps["name"]),
            &caps["version"],
        ));
    }
    let caps = SIMPLE_ZIP.captures(name)?;
    let version = caps["version"].split("-npm-").next().unwrap_or(&caps["version"]);
    Some(PackageIdentity::new(&caps["name"], version))
}

fn manifest_identity(path: &Path) -> Option<PackageIdentity> {
    let manifest = read_manifest(path)?;
    let name = manifest.name.filter(|n| !n.is_empty())?;
    Some(match manifest.version.filter(|v| !v.is_empty()) {
        Some(version) => PackageIdentity::new(name, version),
        None => PackageIdentity::unversioned(name),
    })
}

impl NpmRules {
    /// Identity for files that live inside a `node_modules` package.
    fn identify_installed(&self, file: &Path, name: String, package_root: &Path) -> PackageIdentity {
        let identity = pnpm_identity(file).unwrap_or_else(|| {
            match read_manifest(&package_root.join("package.json")).and_then(|m| m.version) {
                Some(version) => PackageIdentity::new(name, version),
                None => PackageIdentity::unversioned(name),
            }
        });

        // A platform directory nested inside the package.
        match self.unit_dir(file) {
            Some(dir) if dir.as_path() != package_root => match file_name(&dir) {
                Some(platform) if PLATFORM_DIR.is_match(platform) => {
                    identity.with_qualifier(platform)
                }
                _ => identity,
            },
            _ => identity,
        }
    }

    /// Identity from the file name alone.
    fn identify_file(&self, file: &Path, name: &str) -> Option<PackageIdentity> {
        if name == "package.json" {
            return manifest_identity(file);
        }
        if let Some(stripped) = PARTIAL_SUFFIXES.iter().find_map(|s| name.strip_suffix(s)) {
            let tarball = if stripped.ends_with(".tgz") {
                stripped.to_string()
            } else {
                format!("{stripped}.tgz")
            };
            return parse_tarball(&tarball);
        }
        if name.ends_with(".tgz") {
            return parse_tarball(name);
        }
        if name.ends_with(".zip") {
            return parse_zip(name);
        }
        if CONTENT_HASH.is_match(name) {
            let sibling = file.with_file_name("package.json");
            return manifest_identity(&sibling).or_else(|| {
                Some(PackageIdentity::new("content-addressed", name.trim_end_matches("-exec")))
            });
        }
        None
    }
}

impl EcosystemRules for NpmRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn should_exclude(&self, dir: &Path) -> bool {
        let Some(name) = file_name(dir) else {
            return false;
        };
        if NOISE_DIRS.contains(&name) {
            return true;
        }
        if in_cache_store(dir) {
            return false;
        }
        if name.starts_with('.') && !KEPT_DOT_DIRS.contains(&name) {
            return true;
        }

        let symlink = is_symlink(dir);
        if symlink && (!has_segment(dir, "node_modules") || links_into_pnpm_store(dir)) {
            return true;
        }

        // Inside the pnpm virtual store, only walk each entry's own
        // node_modules; its dependencies are links to sibling entries.
        let parts: Vec<&OsStr> = dir.iter().collect();
        if let Some(idx) = parts.iter().position(|p| *p == ".pnpm") {
            if idx + 1 < parts.len() && symlink {
                return true;
            }
            let nested = parts[idx + 1..]
                .iter()
                .filter(|p| **p == "node_modules")
                .count();
            if nested > 1 {
                return true;
            }
        }
        false
    }

    fn is_target_file(&self, file: &Path) -> bool {
        file_name(file).is_some_and(|name| {
            name == "package.json"
                || name.ends_with(".tgz")
                || name.ends_with(".zip")
                || CONTENT_HASH.is_match(name)
        })
    }

    fn is_invalid_file(&self, file: &Path) -> bool {
        let Some(name) = file_name(file) else {
            return false;
        };
        if PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            return true;
        }
        // Conflicting lockfiles from different package managers.
        match name {
            "package-lock.json" => file.with_file_name("yarn.lock").exists(),
            "yarn.lock" => file.with_file_name("pnpm-lock.yaml").exists(),
            _ => false,
        }
    }

    fn unit_dir(&self, file: &Path) -> Option<PathBuf> {
        let parent = file.parent()?;
        match node_modules_package(file) {
            // Platform directories nested in a package are units of their own.
            Some(_) if parent_name(file).is_some_and(|p| PLATFORM_DIR.is_match(p)) => {
                Some(parent.to_path_buf())
            }
            Some((_, package_root)) => Some(package_root),
            None => Some(parent.to_path_buf()),
        }
    }

    fn identify(&self, _root: &Path, file: &Path) -> PackageIdentity {
        if let Some((name, package_root)) = node_modules_package(file) {
            return self.identify_installed(file, name, &package_root);
        }

        let Some(name) = file_name(file) else {
            return PackageIdentity::unknown();
        };
        if let Some(identity) = self.identify_file(file, name) {
            return identity;
        }

        // Stray markers such as conflicting lockfiles.
        match self.unit_dir(file).as_deref().and_then(file_name) {
            Some(dir) => PackageIdentity::unversioned(dir),
            None => PackageIdentity::unknown(),
        }
    }

    fn is_snapshot(&self, unit: &PackageUnit) -> bool {
        PRERELEASE.is_match(&unit.version)
    }

    fn is_native(&self, unit: &PackageUnit) -> bool {
        unit.qualifier.is_some() || PLATFORM_DIR.is_match(&unit.dir_name())
    }

    fn matches_target(&self, unit: &PackageUnit, target: &str) -> bool {
        let target = target.to_ascii_lowercase();
        let name = unit.canonical_name.to_ascii_lowercase();
        if name == target || name.rsplit('/').next() == Some(target.as_str()) {
            return true;
        }
        // `name@version` targets match as a prefix of the display name.
        target.get(1..).is_some_and(|rest| rest.contains('@'))
            && unit
                .package_name(Ecosystem::Npm)
                .to_ascii_lowercase()
                .starts_with(&target)
    }
}
