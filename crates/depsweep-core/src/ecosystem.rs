//! Supported package-manager ecosystems.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A package manager's cache/repository convention.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Ecosystem {
    /// Maven local repository (`~/.m2/repository`).
    Maven,
    /// Gradle module cache (`caches/modules-2/files-2.1`).
    Gradle,
    /// npm, yarn and pnpm caches and `node_modules` trees.
    Npm,
    /// pip caches, site-packages and conda environments.
    Pip,
}

impl Ecosystem {
    /// Separator placed between a package name and its version for display.
    pub fn separator(self) -> &'static str {
        match self {
            Self::Maven | Self::Gradle => ":",
            Self::Npm | Self::Pip => "@",
        }
    }

    /// Guess the ecosystem a project uses from its build marker files.
    ///
    /// Markers are checked in a fixed order, so a project carrying both a
    /// `pom.xml` and a `package.json` is reported as Maven.
    pub fn detect(project_dir: &Path) -> Option<Self> {
        let has = |name: &str| project_dir.join(name).exists();

        if has("pom.xml") {
            Some(Self::Maven)
        } else if has("build.gradle") || has("build.gradle.kts") {
            Some(Self::Gradle)
        } else if has("package.json") {
            Some(Self::Npm)
        } else if has("requirements.txt") || has("setup.py") || has("pyproject.toml") {
            Some(Self::Pip)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_string_forms() {
        assert_eq!(Ecosystem::Npm.to_string(), "npm");
        assert_eq!(Ecosystem::from_str("Gradle").unwrap(), Ecosystem::Gradle);
        assert!(Ecosystem::from_str("cargo").is_err());
    }

    #[test]
    fn test_separator() {
        assert_eq!(Ecosystem::Maven.separator(), ":");
        assert_eq!(Ecosystem::Npm.separator(), "@");
    }
}
