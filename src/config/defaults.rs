//! User defaults file (`config.toml`).
//!
//! ```toml
//! [defaults]
//! force = false
//! overwrite_others = false
//! make_parents = true
//! non_interactive = false
//! exclude = ["~/dotfiles/.git"]
//! ```
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Root of the defaults file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsFile {
    /// The `[defaults]` table.
    #[serde(default)]
    pub defaults: Defaults,
}

/// Values applied when the matching CLI flag is not given.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Relax the existence rule.
    #[serde(default)]
    pub force: bool,
    /// Relax the ownership rule.
    #[serde(default)]
    pub overwrite_others: bool,
    /// Create missing destination parents; `None` keeps the built-in default.
    #[serde(default)]
    pub make_parents: Option<bool>,
    /// Skip the confirmation prompt.
    #[serde(default)]
    pub non_interactive: bool,
    /// Paths always excluded, before `~`/`$VAR` expansion.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Default location: `$XDG_CONFIG_HOME/pstow/config.toml`, falling back to
/// `~/.config/pstow/config.toml`.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("pstow").join("config.toml"))
}

/// Load defaults from `path`.  A missing file yields empty defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Defaults`] if the file exists but cannot be read
/// or is not valid TOML of the expected shape.
pub fn load(path: &Path) -> Result<Defaults, ConfigError> {
    let invalid = |message: String| ConfigError::Defaults {
        path: path.to_path_buf(),
        message,
    };
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(invalid(e.to_string())),
    };
    let file: DefaultsFile = toml::from_str(&content).map_err(|e| invalid(e.message().to_string()))?;
    Ok(file.defaults)
}
