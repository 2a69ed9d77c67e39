//! Default repository locations per ecosystem.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use depsweep_core::Ecosystem;

/// Environment variables that may point at an npm-style cache, in order.
const NPM_CACHE_VARS: &[&str] = &[
    "NPM_CACHE_DIR",
    "npm_config_cache",
    "YARN_CACHE_FOLDER",
    "PNPM_STORE_DIR",
];

/// Whether `path` is an existing, writable directory.
pub fn is_valid_repo_path(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir()) && can_create_files(path)
}

/// Ownership and ACLs only show up on an actual write, so create and
/// remove an empty file.
fn can_create_files(dir: &Path) -> bool {
    let check = dir.join(format!(".depsweep-write-{}", std::process::id()));
    match fs::OpenOptions::new().write(true).create_new(true).open(&check) {
        Ok(_) => fs::remove_file(&check).is_ok(),
        Err(err) => err.kind() == io::ErrorKind::AlreadyExists,
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    let value = env::var_os(var)?;
    let path = PathBuf::from(value);
    (!path.as_os_str().is_empty() && is_valid_repo_path(&path)).then_some(path)
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    is_valid_repo_path(&path).then_some(path)
}

fn maven_root() -> Option<PathBuf> {
    existing(dirs::home_dir()?.join(".m2").join("repository"))
}

fn gradle_root() -> Option<PathBuf> {
    let home = env_dir("GRADLE_USER_HOME").or_else(|| Some(dirs::home_dir()?.join(".gradle")))?;
    existing(home.join("caches").join("modules-2").join("files-2.1"))
}

fn npm_root(project_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(modules) = project_dir.and_then(|p| existing(p.join("node_modules"))) {
        return Some(modules);
    }
    if let Some(dir) = NPM_CACHE_VARS.iter().find_map(|var| env_dir(var)) {
        return Some(dir);
    }
    if cfg!(windows) {
        existing(dirs::data_dir()?.join("npm-cache"))
    } else {
        existing(dirs::home_dir()?.join(".npm"))
    }
}

fn pip_root() -> Option<PathBuf> {
    if let Some(dir) = env_dir("PIP_CACHE_DIR") {
        return Some(dir);
    }
    let cache = dirs::cache_dir()?;
    if cfg!(windows) {
        existing(cache.join("pip").join("Cache"))
    } else {
        existing(cache.join("pip"))
    }
}

/// Conventional repository root for an ecosystem, if one exists on this
/// machine.
///
/// For npm, a `node_modules` directory inside `project_dir` wins over the
/// global caches.
pub fn default_root(ecosystem: Ecosystem, project_dir: Option<&Path>) -> Option<PathBuf> {
    let root = match ecosystem {
        Ecosystem::Maven => maven_root(),
        Ecosystem::Gradle => gradle_root(),
        Ecosystem::Npm => npm_root(project_dir),
        Ecosystem::Pip => pip_root(),
    };
    match &root {
        Some(path) => tracing::debug!("Default {} root: {}", ecosystem, path.display()),
        None => tracing::debug!("No default {} root found", ecosystem),
    }
    root
}
