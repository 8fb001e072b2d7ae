//! Replicate a trimmed [`PathTree`] into a destination as symlinks.
//!
//! Every file in the tree becomes one link at
//! `destination / <path relative to the tree root>`.  Directories are never
//! linked themselves; they are created (when allowed) to hold the links.
pub mod policy;
pub mod symlink;

use std::fmt;
use std::path::{Path, PathBuf};

pub use policy::{LinkPolicy, Rule, Verdict};
pub use symlink::{DestinationState, LinkChange, Symlink};

use crate::error::PathError;
use crate::logging::{EntryStatus, Log};
use crate::tree::PathTree;

/// Counts of link outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Links created.
    pub linked: u32,
    /// Destinations that already linked to the right source.
    pub already_linked: u32,
    /// Destinations refused by the policy.
    pub skipped: u32,
    /// Entries abandoned after a filesystem error.
    pub failed: u32,
}

impl LinkReport {
    /// One-line summary, phrased for a real run or a preview.
    #[must_use]
    pub fn summary(&self, preview: bool) -> String {
        let verb = if preview { "would link" } else { "linked" };
        let mut line = format!("{} {verb}, {} already linked", self.linked, self.already_linked);
        if self.skipped > 0 {
            line.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }
}

/// Walks a tree and links each file into the destination.
pub struct LinkEngine<'a> {
    destination: PathBuf,
    policy: LinkPolicy<'a>,
    make_parents: bool,
    log: &'a dyn Log,
}

impl fmt::Debug for LinkEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkEngine")
            .field("destination", &self.destination)
            .field("policy", &self.policy)
            .field("make_parents", &self.make_parents)
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl<'a> LinkEngine<'a> {
    /// Create an engine linking into the canonical `destination`.
    #[must_use]
    pub const fn new(
        destination: PathBuf,
        policy: LinkPolicy<'a>,
        make_parents: bool,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            destination,
            policy,
            make_parents,
            log,
        }
    }

    /// Destination that `source` maps to, if `source` lies inside `tree`.
    #[must_use]
    pub fn destination_for(&self, tree: &PathTree, source: &Path) -> Option<PathBuf> {
        tree.relative(source).map(|rel| self.destination.join(rel))
    }

    /// Link every file of `tree`: this level first, then each branch.
    ///
    /// Policy refusals and per-entry filesystem errors are logged, recorded
    /// and counted; the walk carries on with the next entry.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::MissingParent`] when a destination directory is
    /// missing and parents may not be created.  Links made before that point
    /// are left in place.
    pub fn link(&self, tree: &PathTree) -> Result<LinkReport, PathError> {
        let mut report = LinkReport::default();
        self.link_level(tree, tree, &mut report)?;
        Ok(report)
    }

    fn link_level(
        &self,
        root: &PathTree,
        level: &PathTree,
        report: &mut LinkReport,
    ) -> Result<(), PathError> {
        for source in level.contents() {
            let Some(target) = self.destination_for(root, source) else {
                continue;
            };
            self.link_one(source, target, report)?;
        }
        for branch in level.branches() {
            self.link_level(root, branch, report)?;
        }
        Ok(())
    }

    fn link_one(
        &self,
        source: &Path,
        target: PathBuf,
        report: &mut LinkReport,
    ) -> Result<(), PathError> {
        match self.policy.evaluate(&target) {
            Ok(Verdict::Permit) => {}
            Ok(Verdict::Deny { rule, reason }) => {
                self.log.warn(&format!(
                    "skipping {} ({rule}: {reason})",
                    target.display()
                ));
                self.log
                    .record_entry(target, EntryStatus::Skipped, Some(&reason));
                report.skipped += 1;
                return Ok(());
            }
            Err(e) => {
                let message = format!("cannot inspect {}: {e}", target.display());
                self.fail(target, &message, report);
                return Ok(());
            }
        }

        if let Some(parent) = target.parent()
            && !parent.exists()
        {
            if !self.make_parents {
                return Err(PathError::MissingParent(parent.to_path_buf()));
            }
            if let Err(e) = symlink::ensure_parent_dir(&target) {
                self.fail(target, &e.to_string(), report);
                return Ok(());
            }
            self.log.debug(&format!("created {}", parent.display()));
        }

        match Symlink::new(source.to_path_buf(), target.clone()).apply() {
            Ok(LinkChange::Created) => {
                self.log.debug(&format!(
                    "{} -> {}",
                    target.display(),
                    source.display()
                ));
                self.log.record_entry(target, EntryStatus::Linked, None);
                report.linked += 1;
            }
            Ok(LinkChange::AlreadyLinked) => {
                self.log
                    .debug(&format!("already linked: {}", target.display()));
                self.log
                    .record_entry(target, EntryStatus::AlreadyLinked, None);
                report.already_linked += 1;
            }
            Err(e) => self.fail(target, &e.to_string(), report),
        }
        Ok(())
    }

    fn fail(&self, target: PathBuf, message: &str, report: &mut LinkReport) {
        self.log.error(message);
        self.log
            .record_entry(target, EntryStatus::Failed, Some(message));
        report.failed += 1;
    }

    /// Report what [`link`](Self::link) would do without touching the
    /// filesystem.
    #[must_use]
    pub fn preview(&self, tree: &PathTree) -> LinkReport {
        let mut report = LinkReport::default();
        for source in tree.files() {
            let Some(target) = self.destination_for(tree, source) else {
                continue;
            };
            match self.policy.evaluate(&target) {
                Err(e) => {
                    self.log
                        .dry_run(&format!("would fail {}: {e}", target.display()));
                    report.failed += 1;
                }
                Ok(Verdict::Deny { rule, reason }) => {
                    self.log.dry_run(&format!(
                        "would skip {} ({rule}: {reason})",
                        target.display()
                    ));
                    report.skipped += 1;
                }
                Ok(Verdict::Permit) => {
                    let state = Symlink::new(source.to_path_buf(), target.clone()).state();
                    if state == DestinationState::Linked {
                        report.already_linked += 1;
                    } else {
                        self.log.dry_run(&format!(
                            "would link {} -> {}",
                            target.display(),
                            source.display()
                        ));
                        report.linked += 1;
                    }
                }
            }
        }
        report
    }
}
