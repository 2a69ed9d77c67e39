//! pip rules: the pip cache and `site-packages` installations.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use depsweep_core::{Ecosystem, PackageIdentity, PackageUnit};

use super::{EcosystemRules, file_name, parent_name};

/// PEP 440-ish version grammar used inside file names.
const VERSION: &str = r"\d+(?:\.\d+)*(?:[._-]?(?:dev|a|alpha|b|beta|rc|c|pre|preview|post|rev|r)\d*)*(?:\+[a-zA-Z0-9.]*)?";

static VERSION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{VERSION}$")).unwrap());

static NAME_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^(?P<name>.+?)-(?P<version>{VERSION})$")).unwrap());

static EGG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<name>.+?)-(?P<version>{VERSION})(?:-py\d(?:\.\d+)?.*)?\.egg$")).unwrap()
});

static EGG_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<name>.+?)-(?P<version>{VERSION})(?:-py\d(?:\.\d+)?)?\.egg-info$"))
        .unwrap()
});

static DIST_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<name>.+?)-(?P<version>{VERSION})\.dist-info$")).unwrap()
});

static HEADER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Name:\s*(.+?)\s*$").unwrap());

static HEADER_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Version:\s*(.+?)\s*$").unwrap());

static SETUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name\s*=\s*['"]([^'"]+)['"]"#).unwrap());

static SETUP_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version\s*=\s*['"]([^'"]+)['"]"#).unwrap());

static PRERELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v?\d+(?:\.\d+)*(?:[-_.]?(?:a|alpha|b|beta|c|rc|pre|preview|dev|post|rev|r)\d*)+")
        .unwrap()
});

static PLATFORM_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[.-])(?:cp\d+|py\d+|abi3)-(?:win|linux|darwin|macosx|manylinux\w*|musllinux\w*)_\w*(?:x86_64|amd64|arm64|aarch64|i686|win32)",
    )
    .unwrap()
});

static NAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

const ARCHIVE_SUFFIXES: &[&str] = &[".whl", ".tar.gz", ".tar.bz2", ".tar.xz", ".zip", ".egg"];
const SDIST_SUFFIXES: &[&str] = &[".tar.gz", ".tar.bz2", ".tar.xz", ".zip"];
const PARTIAL_SUFFIXES: &[&str] = &[".incomplete", ".part", ".downloading"];
const DIST_INFO_FILES: &[&str] = &["METADATA", "RECORD", "WHEEL", "direct_url.json"];
const EXCLUDED_DIRS: &[&str] = &["__pycache__", "tests", "test", "docs", "conda-meta"];

/// Normalize a distribution name: lowercase, runs of `-`, `_` and `.`
/// collapsed into a single `-`.
pub fn normalize_name(name: &str) -> String {
    NAME_SEPARATORS
        .replace_all(&name.trim().to_lowercase(), "-")
        .into_owned()
}

fn is_metadata_dir(name: &str) -> bool {
    name.ends_with(".dist-info") || name.ends_with(".egg-info") || name == "EGG-INFO"
}

fn captures_identity(regex: &Regex, text: &str) -> Option<PackageIdentity> {
    let caps = regex.captures(text)?;
    Some(PackageIdentity::new(&caps["name"], &caps["version"]))
}

/// `name-version` split on the last hyphen, for names no pattern matched.
fn split_name_version(stem: &str) -> Option<PackageIdentity> {
    captures_identity(&NAME_VERSION, stem).or_else(|| {
        let (name, version) = stem.rsplit_once('-')?;
        (!name.is_empty() && !version.is_empty()).then(|| PackageIdentity::new(name, version))
    })
}

/// Wheel names are `name-version(-build)?-python-abi-platform.whl` with
/// no hyphens inside fields.
fn parse_wheel(file_name: &str) -> Option<PackageIdentity> {
    let stem = file_name.strip_suffix(".whl")?;
    let fields: Vec<&str> = stem.split('-').collect();
    if fields.len() < 5 || !VERSION_ONLY.is_match(fields[1]) {
        return None;
    }
    let identity = PackageIdentity::new(fields[0], fields[1]);
    let python = fields[fields.len() - 3];
    let platform = fields[fields.len() - 1];
    Some(if platform == "any" {
        identity
    } else {
        identity.with_qualifier(format!("{python}-{platform}"))
    })
}

fn parse_headers(path: &Path) -> Option<PackageIdentity> {
    let content = fs::read_to_string(path).ok()?;
    let name = HEADER_NAME.captures(&content)?.get(1)?.as_str().to_string();
    Some(match HEADER_VERSION.captures(&content).and_then(|c| c.get(1)) {
        Some(version) => PackageIdentity::new(name, version.as_str()),
        None => PackageIdentity::unversioned(name),
    })
}

fn parse_setup_py(path: &Path) -> Option<PackageIdentity> {
    let content = fs::read_to_string(path).ok()?;
    let name = SETUP_NAME.captures(&content)?.get(1)?.as_str().to_string();
    Some(match SETUP_VERSION.captures(&content).and_then(|c| c.get(1)) {
        Some(version) => PackageIdentity::new(name, version.as_str()),
        None => PackageIdentity::unversioned(name),
    })
}

/// Identity from an artifact file name alone.
fn parse_archive_name(name: &str) -> Option<PackageIdentity> {
    if name.ends_with(".whl") {
        return parse_wheel(name).or_else(|| split_name_version(name.strip_suffix(".whl")?));
    }
    if name.ends_with(".egg") {
        return captures_identity(&EGG, name);
    }
    if name.ends_with(".egg-info") {
        return captures_identity(&EGG_INFO, name);
    }
    let stem = SDIST_SUFFIXES.iter().find_map(|s| name.strip_suffix(s))?;
    split_name_version(stem)
}

/// Whether a pip HTTP cache directory holds no usable archives.
///
/// Listing errors keep the directory.
fn is_opaque_http_cache(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    !entries.flatten().any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        name.ends_with(".whl") || name.ends_with(".tar.gz")
    })
}

/// Rules for pip caches and Python installations.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipRules {
    skip_foreign_installers: bool,
}

impl PipRules {
    /// Create rules. With `skip_foreign_installers`, distributions whose
    /// `INSTALLER` file names a tool other than pip are skipped.
    pub fn new(skip_foreign_installers: bool) -> Self {
        Self {
            skip_foreign_installers,
        }
    }

    fn installed_by_other_tool(&self, dist_info: &Path) -> bool {
        match fs::read_to_string(dist_info.join("INSTALLER")) {
            Ok(installer) => {
                let installer = installer.trim();
                !installer.is_empty() && !installer.contains("pip")
            }
            Err(_) => false,
        }
    }

    fn parse(&self, file: &Path) -> Option<PackageIdentity> {
        let name = file_name(file)?;

        if let Some(stripped) = PARTIAL_SUFFIXES.iter().find_map(|s| name.strip_suffix(s)) {
            return parse_archive_name(stripped);
        }
        if ARCHIVE_SUFFIXES.iter().any(|s| name.ends_with(s)) || name.ends_with(".egg-info") {
            return parse_archive_name(name).or_else(|| {
                let dir = file.parent()?;
                split_name_version(file_name(dir)?)
            });
        }

        let parent = file.parent()?;
        let parent_name = file_name(parent)?;
        if parent_name.ends_with(".dist-info") {
            return captures_identity(&DIST_INFO, parent_name)
                .or_else(|| parse_headers(&parent.join("METADATA")));
        }
        if parent_name.ends_with(".egg-info") {
            return captures_identity(&EGG_INFO, parent_name)
                .or_else(|| parse_headers(&parent.join("PKG-INFO")));
        }
        if name == "PKG-INFO" {
            return parse_headers(file);
        }
        if name == "setup.py" {
            return parse_setup_py(file).or_else(|| split_name_version(parent_name));
        }
        split_name_version(parent_name)
    }
}

impl EcosystemRules for PipRules {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn should_exclude(&self, dir: &Path) -> bool {
        let Some(name) = file_name(dir) else {
            return false;
        };
        if name.starts_with('.') || EXCLUDED_DIRS.contains(&name) {
            return true;
        }

        let parent = parent_name(dir);
        if parent.is_some_and(|p| p.ends_with(".dist-info") || p.ends_with(".egg-info")) {
            return true;
        }
        // The installer itself is never a cleanup candidate.
        if parent == Some("site-packages")
            && (name.starts_with("pip-") || name.starts_with("setuptools-"))
        {
            return true;
        }

        let in_pip_cache = dir.iter().any(|s| s.eq_ignore_ascii_case("pip"));
        if in_pip_cache && dir.iter().any(|s| s == "http" || s == "http-v2") {
            return is_opaque_http_cache(dir);
        }

        self.skip_foreign_installers
            && name.ends_with(".dist-info")
            && self.installed_by_other_tool(dir)
    }

    fn is_target_file(&self, file: &Path) -> bool {
        let Some(name) = file_name(file) else {
            return false;
        };
        if ARCHIVE_SUFFIXES.iter().any(|s| name.ends_with(s)) || name.ends_with(".egg-info") {
            return true;
        }
        let Some(parent) = parent_name(file) else {
            return false;
        };
        match name {
            _ if DIST_INFO_FILES.contains(&name) => parent.ends_with(".dist-info"),
            "PKG-INFO" => is_metadata_dir(parent),
            "installed-files.txt" => parent.ends_with(".egg-info"),
            "requires.txt" => is_metadata_dir(parent),
            "setup.py" => parent.contains('-'),
            _ => false,
        }
    }

    fn is_invalid_file(&self, file: &Path) -> bool {
        file_name(file).is_some_and(|name| PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)))
    }

    fn identify(&self, _root: &Path, file: &Path) -> PackageIdentity {
        match self.parse(file) {
            Some(identity) => PackageIdentity {
                name: normalize_name(&identity.name).into(),
                ..identity
            },
            None => PackageIdentity::unknown(),
        }
    }

    fn is_snapshot(&self, unit: &PackageUnit) -> bool {
        PRERELEASE.is_match(&unit.version)
    }

    fn is_native(&self, unit: &PackageUnit) -> bool {
        unit.qualifier.is_some() || PLATFORM_TAG.is_match(&unit.dir_name())
    }

    fn matches_target(&self, unit: &PackageUnit, target: &str) -> bool {
        unit.canonical_name.starts_with(&normalize_name(target))
    }
}
