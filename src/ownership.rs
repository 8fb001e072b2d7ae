//! Ownership queries behind an injectable trait.
//!
//! Both the ownership trim and the link policy ask "does the invoking user
//! own this entry?".  The answer is always read live from the filesystem, so
//! a long run can observe an owner change between trimming and linking.
//! Production code uses [`SystemOwnership`]; tests substitute a mock because
//! they cannot `chown` without privileges.

use std::path::Path;

/// Abstraction over file-ownership lookups.
#[cfg_attr(test, mockall::automock)]
pub trait Ownership: Send + Sync {
    /// Returns `true` if the entry at `path` (not its link target) is owned
    /// by the invoking user.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry's metadata cannot be read.
    fn owned_by_invoker(&self, path: &Path) -> std::io::Result<bool>;
}

/// Production [`Ownership`] implementation comparing the entry's uid with the
/// effective uid of the process.
#[derive(Debug, Clone, Copy)]
pub struct SystemOwnership {
    uid: u32,
}

impl SystemOwnership {
    /// Capture the effective uid of the current process.
    #[must_use]
    pub fn current() -> Self {
        Self { uid: effective_uid() }
    }

    /// Treat `uid` as the invoking user.
    #[must_use]
    pub const fn with_uid(uid: u32) -> Self {
        Self { uid }
    }

    /// The uid entries are compared against.
    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }
}

impl Ownership for SystemOwnership {
    #[cfg(unix)]
    fn owned_by_invoker(&self, path: &Path) -> std::io::Result<bool> {
        use std::os::unix::fs::MetadataExt as _;
        Ok(std::fs::symlink_metadata(path)?.uid() == self.uid)
    }

    #[cfg(not(unix))]
    fn owned_by_invoker(&self, path: &Path) -> std::io::Result<bool> {
        std::fs::symlink_metadata(path).map(|_| true)
    }
}

#[cfg(unix)]
fn effective_uid() -> u32 {
    // SAFETY: geteuid takes no arguments, touches no memory and cannot fail.
    #[allow(unsafe_code)]
    unsafe {
        libc::geteuid()
    }
}

#[cfg(not(unix))]
const fn effective_uid() -> u32 {
    0
}
