//! Ordered trimming pipeline applied to a freshly traversed source tree.
//!
//! Stages run in a fixed order: explicit exclusions, `.stowconfig` ignore
//! rules, foreign ownership, empty-directory pruning.  Every stage only
//! removes entries from the in-memory tree; the filesystem is read (for
//! ignore patterns and ownership) but never written.
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, IgnoreError, StowError};
use crate::logging::Log;
use crate::ownership::Ownership;
use crate::tree::{PathTree, UNBOUNDED};

/// Number of entries removed by each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimReport {
    /// Files and subtrees removed by explicit exclusions.
    pub excluded: usize,
    /// Entries removed by `.stowconfig` ignore rules.
    pub ignored: usize,
    /// Files and subtrees removed for belonging to another user.
    pub foreign: usize,
    /// Subtrees pruned for containing no files.
    pub pruned: usize,
}

impl fmt::Display for TrimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} excluded, {} ignored, {} foreign, {} empty directories pruned",
            self.excluded, self.ignored, self.foreign, self.pruned
        )
    }
}

/// Runs the trim stages against a [`PathTree`].
pub struct TrimEngine<'a> {
    log: &'a dyn Log,
    ownership: &'a dyn Ownership,
}

impl fmt::Debug for TrimEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrimEngine")
            .field("log", &"<dyn Log>")
            .field("ownership", &"<dyn Ownership>")
            .finish()
    }
}

impl<'a> TrimEngine<'a> {
    /// Create an engine that logs to `log` and asks `ownership` about
    /// owners.
    #[must_use]
    pub const fn new(log: &'a dyn Log, ownership: &'a dyn Ownership) -> Self {
        Self { log, ownership }
    }

    /// Remove each canonical path in `exclusions` from the tree.  A path
    /// naming a subtree removes the whole subtree; anything else is removed
    /// as a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ExcludesSource`] if an exclusion is the tree
    /// root itself, and [`StowError::Tree`] if the tree refuses a removal.
    pub fn exclude(
        &self,
        tree: &mut PathTree,
        exclusions: &[PathBuf],
    ) -> Result<usize, StowError> {
        let mut removed = 0;
        for exclusion in exclusions {
            if exclusion == tree.path() {
                return Err(ConfigError::ExcludesSource(exclusion.clone()).into());
            }
            let hit = tree.trim_branch(exclusion, UNBOUNDED)?
                || tree.trim_file(exclusion, UNBOUNDED)?;
            if hit {
                removed += 1;
                self.log.debug(&format!("excluded {}", exclusion.display()));
            } else {
                self.log
                    .debug(&format!("exclusion matched nothing: {}", exclusion.display()));
            }
        }
        Ok(removed)
    }

    /// Apply every `.stowconfig` in the tree, top-down.
    ///
    /// # Errors
    ///
    /// Returns the [`IgnoreError`] of the first config that cannot be read
    /// or whose patterns cannot be resolved.
    pub fn ignore(&self, tree: &mut PathTree) -> Result<usize, IgnoreError> {
        tree.trim_ignored(UNBOUNDED, self.log)
    }

    /// Remove every subtree and file not owned by the invoking user.
    ///
    /// Ownership is read live for each entry.  An entry whose owner cannot
    /// be determined is treated as foreign.
    pub fn ownership(&self, tree: &mut PathTree) -> usize {
        let branches =
            tree.trim_branch_rule(&mut |b: &PathTree, _| self.is_foreign(b.path()), UNBOUNDED);
        let files = tree.trim_file_rule(&mut |p: &Path, _| self.is_foreign(p), UNBOUNDED);
        branches + files
    }

    /// Remove every subtree that no longer holds any file.
    pub fn prune(&self, tree: &mut PathTree) -> usize {
        tree.trim_branch_rule(&mut |b: &PathTree, _| b.is_empty(), UNBOUNDED)
    }

    fn is_foreign(&self, path: &Path) -> bool {
        match self.ownership.owned_by_invoker(path) {
            Ok(true) => false,
            Ok(false) => {
                self.log
                    .debug(&format!("not owned by invoking user: {}", path.display()));
                true
            }
            Err(e) => {
                self.log
                    .warn(&format!("cannot read owner of {}: {e}", path.display()));
                true
            }
        }
    }
}
