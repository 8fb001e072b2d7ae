//! One stow run, from traversal to linking.
//!
//! ```text
//! Pending -> Built -> Excluded -> IgnoreTrimmed -> OwnershipTrimmed
//!         -> EmptyPruned -> Confirmed -> Linked
//!                        \-> Aborted
//! ```
//!
//! Nothing touches the destination before `Confirmed`, so an aborted run
//! leaves the filesystem exactly as it found it.
use std::fmt;
use std::path::PathBuf;

use crate::error::{ConfigError, StowError};
use crate::link::{LinkEngine, LinkPolicy, LinkReport};
use crate::logging::Log;
use crate::ownership::Ownership;
use crate::prompt::{Confirm, Confirmation};
use crate::tree::PathTree;
use crate::trim::{TrimEngine, TrimReport};

/// Fully resolved inputs of a run.
///
/// All paths must already be canonical (see [`crate::paths`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StowOptions {
    /// Directory whose contents are linked.
    pub source: PathBuf,
    /// Directory the links are created in; optional only in status mode.
    pub destination: Option<PathBuf>,
    /// Files and directories removed from the source tree up front.
    pub exclude: Vec<PathBuf>,
    /// Replace entries that are not symlinks.
    pub force: bool,
    /// Replace entries owned by other users and keep their source files.
    pub overwrite_others: bool,
    /// Create missing destination directories.
    pub make_parents: bool,
    /// Do not ask before linking.
    pub non_interactive: bool,
    /// Build, trim and display only.
    pub status: bool,
}

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StowState {
    /// Nothing has happened yet.
    Pending,
    /// The source tree was traversed.
    Built,
    /// Explicit exclusions were removed.
    Excluded,
    /// `.stowconfig` rules were applied.
    IgnoreTrimmed,
    /// Foreign entries were removed (or the stage was skipped).
    OwnershipTrimmed,
    /// Empty subtrees were pruned.
    EmptyPruned,
    /// Linking was approved.
    Confirmed,
    /// Links were created.
    Linked,
    /// The run ended without touching the destination.
    Aborted,
}

/// Why a run was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The user answered no, or input ended.
    Declined,
    /// Ctrl-C at the prompt.
    Interrupted,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Declined => "declined",
            Self::Interrupted => "interrupted",
        })
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StowOutcome {
    /// Linking ran; per-entry results are in the report.
    Linked(LinkReport),
    /// Status mode: the tree was shown, plus a preview when a destination
    /// was given.
    Displayed(Option<LinkReport>),
    /// Nothing was linked.
    Aborted(AbortReason),
}

/// Drives one run.
pub struct Stower<'a> {
    options: StowOptions,
    log: &'a dyn Log,
    ownership: &'a dyn Ownership,
    confirm: &'a dyn Confirm,
    state: StowState,
    trimmed: TrimReport,
}

impl fmt::Debug for Stower<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stower")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("trimmed", &self.trimmed)
            .finish_non_exhaustive()
    }
}

impl<'a> Stower<'a> {
    /// Validate `options` and prepare a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDestination`] when linking without a
    /// destination and [`ConfigError::SameSourceAndDestination`] when both
    /// resolve to the same directory.
    pub fn new(
        options: StowOptions,
        log: &'a dyn Log,
        ownership: &'a dyn Ownership,
        confirm: &'a dyn Confirm,
    ) -> Result<Self, ConfigError> {
        match &options.destination {
            None if !options.status => return Err(ConfigError::MissingDestination),
            Some(dest) if *dest == options.source => {
                return Err(ConfigError::SameSourceAndDestination(dest.clone()));
            }
            _ => {}
        }
        Ok(Self {
            options,
            log,
            ownership,
            confirm,
            state: StowState::Pending,
            trimmed: TrimReport::default(),
        })
    }

    /// State reached so far.
    #[must_use]
    pub const fn state(&self) -> StowState {
        self.state
    }

    /// What the trim stages removed.
    #[must_use]
    pub const fn trimmed(&self) -> TrimReport {
        self.trimmed
    }

    fn advance(&mut self, next: StowState) {
        self.log.debug(&format!("state: {:?} -> {next:?}", self.state));
        self.state = next;
    }

    /// Build and trim the source tree.
    ///
    /// # Errors
    ///
    /// Returns a [`StowError`] if an exclusion covers the source or an
    /// ignore config cannot be resolved.
    pub fn prepare(&mut self) -> Result<PathTree, StowError> {
        self.log
            .stage(&format!("Reading {}", self.options.source.display()));
        let mut tree = PathTree::new(self.options.source.clone()).traverse(self.log);
        self.advance(StowState::Built);

        let trim = TrimEngine::new(self.log, self.ownership);
        let mut report = TrimReport {
            excluded: trim.exclude(&mut tree, &self.options.exclude)?,
            ..TrimReport::default()
        };
        self.advance(StowState::Excluded);

        report.ignored = trim.ignore(&mut tree)?;
        self.advance(StowState::IgnoreTrimmed);

        if !self.options.overwrite_others {
            report.foreign = trim.ownership(&mut tree);
        }
        self.advance(StowState::OwnershipTrimmed);

        report.pruned = trim.prune(&mut tree);
        self.advance(StowState::EmptyPruned);

        self.log.debug(&format!("trimmed: {report}"));
        self.trimmed = report;
        Ok(tree)
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Returns a [`StowError`] for configuration, path and ignore failures
    /// and for I/O failures of the prompt.  Declining is not an error.
    pub fn run(&mut self) -> Result<StowOutcome, StowError> {
        let tree = self.prepare()?;
        let policy = LinkPolicy::new(
            self.options.source.clone(),
            self.options.force,
            self.options.overwrite_others,
            self.ownership,
        );

        self.display(&tree);

        let Some(destination) = self.options.destination.clone() else {
            return Ok(StowOutcome::Displayed(None));
        };
        let engine = LinkEngine::new(
            destination.clone(),
            policy,
            self.options.make_parents,
            self.log,
        );

        if self.options.status {
            self.log.stage("Status");
            let preview = engine.preview(&tree);
            self.log.info(&preview.summary(true));
            return Ok(StowOutcome::Displayed(Some(preview)));
        }

        if tree.is_empty() {
            self.log.info("nothing to link");
            self.advance(StowState::Confirmed);
            self.advance(StowState::Linked);
            return Ok(StowOutcome::Linked(LinkReport::default()));
        }

        let answer = if self.options.non_interactive {
            Confirmation::Approved
        } else {
            self.confirm
                .confirm(&format!(
                    "Link {} entries into {}?",
                    tree.len(),
                    destination.display()
                ))
                .map_err(StowError::Prompt)?
        };
        let reason = match answer {
            Confirmation::Approved => None,
            Confirmation::Declined => Some(AbortReason::Declined),
            Confirmation::Interrupted => Some(AbortReason::Interrupted),
        };
        if let Some(reason) = reason {
            self.advance(StowState::Aborted);
            self.log.warn(&format!("aborted ({reason}), nothing was linked"));
            return Ok(StowOutcome::Aborted(reason));
        }
        self.advance(StowState::Confirmed);

        self.log.stage(&format!("Linking into {}", destination.display()));
        let report = engine.link(&tree)?;
        self.advance(StowState::Linked);
        self.log.info(&report.summary(false));
        Ok(StowOutcome::Linked(report))
    }

    fn display(&self, tree: &PathTree) {
        self.log.stage(&format!("{} files to link", tree.len()));
        for line in tree.to_string().lines() {
            self.log.info(line);
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PathError;
    use crate::logging::isolated_logger;
    use crate::ownership::SystemOwnership;
    use crate::prompt::MockConfirm;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        source: PathBuf,
        dest: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        let source = root.join("cfg");
        let dest = root.join("home");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();
        fs::write(source.join("sub/b.txt"), "b").unwrap();
        fs::create_dir(&dest).unwrap();
        Fixture {
            _dir: dir,
            source,
            dest,
        }
    }

    fn options(fx: &Fixture) -> StowOptions {
        StowOptions {
            source: fx.source.clone(),
            destination: Some(fx.dest.clone()),
            make_parents: true,
            ..StowOptions::default()
        }
    }

    fn answering(answer: Confirmation) -> MockConfirm {
        let mut confirm = MockConfirm::new();
        confirm
            .expect_confirm()
            .times(1)
            .returning(move |_| Ok(answer));
        confirm
    }

    #[test]
    fn missing_destination_needs_status_mode() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = MockConfirm::new();
        let opts = StowOptions {
            destination: None,
            ..options(&fx)
        };
        assert!(matches!(
            Stower::new(opts.clone(), &log, &ownership, &confirm),
            Err(ConfigError::MissingDestination)
        ));
        let status = StowOptions {
            status: true,
            ..opts
        };
        assert!(Stower::new(status, &log, &ownership, &confirm).is_ok());
    }

    #[test]
    fn same_source_and_destination_is_rejected() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = MockConfirm::new();
        let opts = StowOptions {
            destination: Some(fx.source.clone()),
            ..options(&fx)
        };
        assert!(matches!(
            Stower::new(opts, &log, &ownership, &confirm),
            Err(ConfigError::SameSourceAndDestination(_))
        ));
    }

    #[test]
    fn approved_run_links_and_reaches_linked() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = answering(Confirmation::Approved);
        let mut stower = Stower::new(options(&fx), &log, &ownership, &confirm).unwrap();

        let outcome = stower.run().unwrap();
        assert!(matches!(outcome, StowOutcome::Linked(r) if r.linked == 2));
        assert_eq!(stower.state(), StowState::Linked);
        assert!(fx.dest.join("sub/b.txt").symlink_metadata().is_ok());
    }

    #[test]
    fn declined_run_touches_nothing() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = answering(Confirmation::Declined);
        let mut stower = Stower::new(options(&fx), &log, &ownership, &confirm).unwrap();

        let outcome = stower.run().unwrap();
        assert_eq!(outcome, StowOutcome::Aborted(AbortReason::Declined));
        assert_eq!(stower.state(), StowState::Aborted);
        assert_eq!(fs::read_dir(&fx.dest).unwrap().count(), 0);
    }

    #[test]
    fn interrupted_run_is_aborted() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = answering(Confirmation::Interrupted);
        let mut stower = Stower::new(options(&fx), &log, &ownership, &confirm).unwrap();
        assert_eq!(
            stower.run().unwrap(),
            StowOutcome::Aborted(AbortReason::Interrupted)
        );
        assert_eq!(fs::read_dir(&fx.dest).unwrap().count(), 0);
    }

    #[test]
    fn non_interactive_never_prompts() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().never();
        let opts = StowOptions {
            non_interactive: true,
            ..options(&fx)
        };
        let mut stower = Stower::new(opts, &log, &ownership, &confirm).unwrap();
        assert!(matches!(stower.run().unwrap(), StowOutcome::Linked(_)));
    }

    #[test]
    fn status_mode_never_prompts_or_links() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().never();
        let opts = StowOptions {
            status: true,
            ..options(&fx)
        };
        let mut stower = Stower::new(opts, &log, &ownership, &confirm).unwrap();

        let outcome = stower.run().unwrap();
        assert!(matches!(outcome, StowOutcome::Displayed(Some(r)) if r.linked == 2));
        assert_eq!(stower.state(), StowState::EmptyPruned);
        assert_eq!(fs::read_dir(&fx.dest).unwrap().count(), 0);
    }

    #[test]
    fn prompt_io_error_is_reported() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let mut confirm = MockConfirm::new();
        confirm
            .expect_confirm()
            .returning(|_| Err(std::io::Error::other("tty gone")));
        let mut stower = Stower::new(options(&fx), &log, &ownership, &confirm).unwrap();
        assert!(matches!(stower.run(), Err(StowError::Prompt(_))));
    }

    #[test]
    fn missing_parent_surfaces_as_path_error() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = MockConfirm::new();
        let opts = StowOptions {
            non_interactive: true,
            make_parents: false,
            ..options(&fx)
        };
        let mut stower = Stower::new(opts, &log, &ownership, &confirm).unwrap();
        assert!(matches!(
            stower.run(),
            Err(StowError::Path(PathError::MissingParent(_)))
        ));
    }

    #[test]
    fn trim_report_is_kept() {
        let fx = fixture();
        let (log, _tmp, _guard) = isolated_logger();
        let ownership = SystemOwnership::current();
        let confirm = MockConfirm::new();
        let opts = StowOptions {
            exclude: vec![fx.source.join("sub/b.txt")],
            status: true,
            ..options(&fx)
        };
        let mut stower = Stower::new(opts, &log, &ownership, &confirm).unwrap();
        let tree = stower.prepare().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(stower.trimmed().excluded, 1);
        assert_eq!(stower.trimmed().pruned, 1);
    }
}
