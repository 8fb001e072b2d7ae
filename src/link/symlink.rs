//! Symlink primitives used by the link walk.
use std::path::{Path, PathBuf};

use crate::error::LinkError;

/// What currently occupies a destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationState {
    /// Nothing is there.
    Missing,
    /// A symlink already pointing at the intended source.
    Linked,
    /// A symlink pointing somewhere else (or dangling).
    OtherLink {
        /// Where the existing link points.
        current: PathBuf,
    },
    /// A regular file or other non-directory entry.
    File,
    /// A real directory.
    Directory,
}

/// Outcome of [`Symlink::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    /// The link was created, replacing whatever was there.
    Created,
    /// The link was already correct; nothing was touched.
    AlreadyLinked,
}

/// A symlink to create at `target` pointing at `source`.
#[derive(Debug, Clone)]
pub struct Symlink {
    /// What the link points to (absolute source path).
    pub source: PathBuf,
    /// Where the link is created.
    pub target: PathBuf,
}

impl Symlink {
    /// Create a new symlink description.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Inspect the target without following a final symlink.
    #[must_use]
    pub fn state(&self) -> DestinationState {
        let Ok(meta) = self.target.symlink_metadata() else {
            return DestinationState::Missing;
        };
        if meta.file_type().is_symlink() {
            return match std::fs::read_link(&self.target) {
                Ok(current) if current == self.source => DestinationState::Linked,
                Ok(current) => DestinationState::OtherLink { current },
                Err(_) => DestinationState::OtherLink {
                    current: PathBuf::new(),
                },
            };
        }
        if meta.is_dir() {
            DestinationState::Directory
        } else {
            DestinationState::File
        }
    }

    /// Replace whatever is at the target with a link to the source.
    ///
    /// A link that already points at the source is left untouched.  The
    /// parent directory must exist.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::DirectoryInTheWay`] if a real directory occupies
    /// the target, or the I/O failure of removing the old entry or creating
    /// the link.
    pub fn apply(&self) -> Result<LinkChange, LinkError> {
        match self.state() {
            DestinationState::Linked => return Ok(LinkChange::AlreadyLinked),
            DestinationState::Directory => {
                return Err(LinkError::DirectoryInTheWay(self.target.clone()));
            }
            DestinationState::OtherLink { .. } | DestinationState::File => {
                remove_existing(&self.target)?;
            }
            DestinationState::Missing => {}
        }
        create_symlink(&self.source, &self.target)?;
        Ok(LinkChange::Created)
    }
}

/// Create every missing ancestor of `path`.
///
/// # Errors
///
/// Returns [`LinkError::CreateParent`] if a directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), LinkError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LinkError::CreateParent {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Remove a file or symlink at `path`, including broken symlinks.  Does
/// nothing if `path` does not exist.  A real directory is never removed.
///
/// # Errors
///
/// Returns [`LinkError::DirectoryInTheWay`] for a real directory and
/// [`LinkError::Remove`] if removal fails.
pub fn remove_existing(path: &Path) -> Result<(), LinkError> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    if meta.is_dir() {
        return Err(LinkError::DirectoryInTheWay(path.to_path_buf()));
    }
    std::fs::remove_file(path).map_err(|source| LinkError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

/// Create a symlink at `link` pointing to `target`.
#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> Result<(), LinkError> {
    std::os::unix::fs::symlink(target, link).map_err(|source| LinkError::Create {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn create_symlink(target: &Path, link: &Path) -> Result<(), LinkError> {
    Err(LinkError::Create {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symlinks are only supported on unix",
        ),
    })
}
