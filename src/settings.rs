//! Persistent user settings (`~/.config/depsweep/settings.toml`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use depsweep_core::{Ecosystem, FilterOptions};

/// Settings read from the config file. Command-line flags override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Filters enabled when no filter flag is given.
    pub filters: FilterOptions,
    /// Move cleaned entries to the trash instead of deleting them.
    pub use_trash: bool,
    /// Skip pip distributions installed by other tools.
    pub skip_foreign_installers: bool,
    /// Repository roots overriding the built-in defaults.
    pub roots: HashMap<Ecosystem, PathBuf>,
}

impl UserSettings {
    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("depsweep").join("settings.toml"))
    }

    /// Load settings from an explicit file. Errors are reported.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Load settings from the default location, or return defaults.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Configured root for an ecosystem, if any.
    pub fn root_for(&self, ecosystem: Ecosystem) -> Option<&Path> {
        self.roots.get(&ecosystem).map(PathBuf::as_path)
    }
}
