//! Command-line interface.
use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::config::Defaults;
use crate::error::{PathError, StowError};
use crate::paths::{self, Resolution};
use crate::stower::StowOptions;

/// Version reported by `--version`: the build's `git describe` when known.
pub(crate) const VERSION: &str = match option_env!("PSTOW_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Top-level CLI entry point for pstow.
#[derive(Parser, Debug)]
#[command(
    name = "pstow",
    about = "Mirror a directory into another with symlinks, honouring per-directory .stowconfig rules",
    version = VERSION
)]
pub struct Cli {
    /// Source directory to stow
    #[arg(short, long, value_name = "DIR", required_unless_present = "completions")]
    pub source: Option<String>,

    /// Destination directory to link into
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<String>,

    /// Accept paths that do not exist yet
    #[arg(short, long)]
    pub loose: bool,

    /// Replace existing entries that are not symlinks
    #[arg(short, long)]
    pub force: bool,

    /// Replace entries owned by other users, and keep their source files
    #[arg(short, long)]
    pub overwrite_others: bool,

    /// Exclude a file or directory of the source (repeatable)
    #[arg(short, long, value_name = "PATH")]
    pub exclude: Vec<String>,

    /// Do not ask for confirmation
    #[arg(short = 'y', long = "yes")]
    pub non_interactive: bool,

    /// Do not create missing destination directories
    #[arg(long)]
    pub no_parents: bool,

    /// Show what would be linked and exit
    #[arg(long)]
    pub status: bool,

    /// Defaults file (default: $XDG_CONFIG_HOME/pstow/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Path of the defaults file to read, if one can be located.
    #[must_use]
    pub fn defaults_path(&self) -> Option<PathBuf> {
        self.config
            .as_ref()
            .map(|raw| paths::expand(&raw.to_string_lossy()))
            .or_else(crate::config::defaults::default_path)
    }

    /// Merge with `defaults` and resolve every path.
    ///
    /// Boolean flags are OR-ed with their defaults, `--no-parents` overrides
    /// `make_parents`, and default exclusions come before CLI ones.
    ///
    /// # Errors
    ///
    /// Returns [`StowError::Path`] when a path is missing (strict mode) or
    /// cannot be resolved, or when the source is not a directory.
    pub fn to_options(&self, defaults: &Defaults) -> Result<StowOptions, StowError> {
        let mode = Resolution::from_loose(self.loose);

        let raw_source = self.source.as_deref().unwrap_or_default();
        let source = paths::resolve(raw_source, mode)?;
        if source.exists() && !source.is_dir() {
            return Err(PathError::Invalid {
                path: source,
                reason: "source is not a directory".to_string(),
            }
            .into());
        }

        let destination = self
            .destination
            .as_deref()
            .map(|raw| paths::resolve(raw, mode))
            .transpose()?;

        let exclude = defaults
            .exclude
            .iter()
            .chain(&self.exclude)
            .map(|raw| resolve_exclusion(raw, mode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StowOptions {
            source,
            destination,
            exclude,
            force: self.force || defaults.force,
            overwrite_others: self.overwrite_others || defaults.overwrite_others,
            make_parents: !self.no_parents && defaults.make_parents.unwrap_or(true),
            non_interactive: self.non_interactive || defaults.non_interactive,
            status: self.status,
        })
    }
}

/// Exclusions keep their final component unresolved so that a symlink
/// inside the source can be excluded as itself.
fn resolve_exclusion(raw: &str, mode: Resolution) -> Result<PathBuf, PathError> {
    let path = paths::resolve_parent(&paths::expand(raw));
    if mode == Resolution::Strict && path.symlink_metadata().is_err() {
        return Err(PathError::NotFound {
            path: PathBuf::from(raw),
        });
    }
    Ok(path)
}
