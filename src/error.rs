//! Domain-specific error types for the stow engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Engine modules return typed errors (e.g., [`ConfigError`], [`IgnoreError`])
//! while the binary converts them to [`anyhow::Error`] at the CLI boundary
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! StowError
//! ├── Config(ConfigError)    invalid run configuration, fatal before traversal
//! ├── Path(PathError)        missing or malformed paths, missing parents
//! ├── Ignore(IgnoreError)    .stowconfig reading and pattern resolution
//! ├── Tree(TreeError)        tree contract violations
//! └── Prompt(io::Error)      the confirmation prompt could not be shown
//! ```
//!
//! Per-entry link failures ([`LinkError`]) never reach this hierarchy: the
//! link walk logs them and moves on to the next entry.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a stow run.
#[derive(Error, Debug)]
pub enum StowError {
    /// The run was configured in a way that can never succeed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required path is missing or malformed.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Ignore rules could not be resolved.
    #[error("Ignore config error: {0}")]
    Ignore(#[from] IgnoreError),

    /// The source tree was misused.
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    /// Reading the confirmation reply failed.
    #[error("Prompt error: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Errors raised before the source tree is traversed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Source and destination resolve to the same directory.
    #[error("source cannot be the same as destination: {0}")]
    SameSourceAndDestination(PathBuf),

    /// A run that links needs a destination.
    #[error("a destination is required unless running in status mode")]
    MissingDestination,

    /// An explicit exclusion would remove the whole source tree.
    #[error("exclusion covers the entire source tree: {0}")]
    ExcludesSource(PathBuf),

    /// The user defaults file exists but cannot be read or parsed.
    #[error("invalid defaults file {path}: {message}")]
    Defaults {
        /// Path of the defaults file.
        path: PathBuf,
        /// Human-readable parse or read failure.
        message: String,
    },
}

/// Errors about individual paths handed to the engine.
#[derive(Error, Debug)]
pub enum PathError {
    /// A path does not exist under strict resolution.
    #[error("path does not exist: {path}")]
    NotFound {
        /// The offending path, as given.
        path: PathBuf,
    },

    /// A path exists but is not usable for its role.
    #[error("invalid path {path}: {reason}")]
    Invalid {
        /// The offending path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A path could not be resolved to its canonical form.
    #[error("cannot resolve {path}: {source}")]
    Resolve {
        /// The offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The parent of a destination is missing and parents may not be created.
    #[error("destination parent directory does not exist: {0}")]
    MissingParent(PathBuf),
}

/// Errors raised while reading or resolving a `.stowconfig` file.
#[derive(Error, Debug)]
pub enum IgnoreError {
    /// The config file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A glob pattern is not valid syntax.
    #[error("invalid pattern '{pattern}' in {config}: {message}")]
    Pattern {
        /// The raw pattern line.
        pattern: String,
        /// Config file declaring the pattern.
        config: PathBuf,
        /// Parser message from the glob engine.
        message: String,
    },

    /// Walking the filesystem for a pattern failed part-way.
    #[error("cannot resolve pattern '{pattern}' at {path}: {source}")]
    Resolve {
        /// The raw pattern line.
        pattern: String,
        /// Path at which matching failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The section is parsed but applying it is not implemented.
    #[error("[{section}] resolution is not implemented ({config})")]
    Unsupported {
        /// Section name without brackets.
        section: &'static str,
        /// Config file declaring the section.
        config: PathBuf,
    },
}

/// Contract violations on [`PathTree`](crate::tree::PathTree) mutation.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A tree was asked to remove itself from its own children.
    #[error("cannot trim a tree from itself: {0}")]
    RemoveSelf(PathBuf),
}

/// Failure of a single link operation.  Logged and counted, never fatal.
#[derive(Error, Debug)]
pub enum LinkError {
    /// A real directory sits where the link should go.
    #[error("refusing to replace directory {0}")]
    DirectoryInTheWay(PathBuf),

    /// Creating the parent directories failed.
    #[error("cannot create parent {path}: {source}")]
    CreateParent {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Removing the previous entry failed.
    #[error("cannot remove existing {path}: {source}")]
    Remove {
        /// Entry that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Creating the symlink failed.
    #[error("cannot link {link} -> {target}: {source}")]
    Create {
        /// Where the link was to be created.
        link: PathBuf,
        /// What the link was to point at.
        target: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
