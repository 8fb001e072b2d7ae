// Shared helpers for integration tests.
//
// Provides a temporary source/destination pair and a fluent builder so each
// integration test can lay out a stow scenario without repeating filesystem
// boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};

use pstow_cli::error::StowError;
use pstow_cli::logging::Logger;
use pstow_cli::ownership::{Ownership, SystemOwnership};
use pstow_cli::prompt::{Confirm, Confirmation};
use pstow_cli::stower::{StowOptions, StowOutcome, Stower};

/// Ownership lookup that reports a fixed set of paths as belonging to
/// someone else.
#[derive(Debug, Default)]
pub struct ForeignPaths {
    foreign: Vec<PathBuf>,
}

impl ForeignPaths {
    pub const fn new(foreign: Vec<PathBuf>) -> Self {
        Self { foreign }
    }
}

impl Ownership for ForeignPaths {
    fn owned_by_invoker(&self, path: &Path) -> io::Result<bool> {
        std::fs::symlink_metadata(path)?;
        Ok(!self.foreign.iter().any(|p| p == path))
    }
}

/// Confirmation that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct Answer(pub Confirmation);

impl Confirm for Answer {
    fn confirm(&self, _question: &str) -> io::Result<Confirmation> {
        Ok(self.0)
    }
}

/// An isolated source/destination pair backed by a [`tempfile::TempDir`].
///
/// Both directories live under one canonicalized root, so paths compare
/// equal to what the engine resolves.
pub struct StowFixture {
    _root: tempfile::TempDir,
    /// Canonical root holding `cfg/` and `home/`.
    pub base: PathBuf,
    /// Source directory (`<base>/cfg`).
    pub source: PathBuf,
    /// Destination directory (`<base>/home`).
    pub dest: PathBuf,
}

impl StowFixture {
    /// Start building a fixture with empty `cfg/` and `home/`.
    pub fn builder() -> FixtureBuilder {
        let root = tempfile::tempdir().expect("create temp dir");
        let base = dunce::canonicalize(root.path()).expect("canonicalize temp dir");
        let source = base.join("cfg");
        let dest = base.join("home");
        std::fs::create_dir_all(&source).expect("create source dir");
        std::fs::create_dir_all(&dest).expect("create dest dir");
        FixtureBuilder {
            fixture: Self {
                _root: root,
                base,
                source,
                dest,
            },
        }
    }

    /// Non-interactive options linking `source` into `dest` with parents.
    pub fn options(&self) -> StowOptions {
        StowOptions {
            source: self.source.clone(),
            destination: Some(self.dest.clone()),
            make_parents: true,
            non_interactive: true,
            ..StowOptions::default()
        }
    }

    /// Run one stow with real ownership lookups.
    pub fn run(&self, options: StowOptions) -> Result<StowOutcome, StowError> {
        self.run_with(options, &SystemOwnership::current())
    }

    /// Run one stow with the given ownership lookup.
    pub fn run_with(
        &self,
        options: StowOptions,
        ownership: &dyn Ownership,
    ) -> Result<StowOutcome, StowError> {
        let log = Logger::new();
        let confirm = Answer(Confirmation::Approved);
        let mut stower = Stower::new(options, &log, ownership, &confirm)?;
        stower.run()
    }

    /// Path inside the source.
    pub fn src(&self, rel: &str) -> PathBuf {
        self.source.join(rel)
    }

    /// Path inside the destination.
    pub fn dst(&self, rel: &str) -> PathBuf {
        self.dest.join(rel)
    }

    /// Whether `rel` in the destination is a symlink pointing at the
    /// matching source path.
    pub fn is_linked(&self, rel: &str) -> bool {
        std::fs::read_link(self.dst(rel)).is_ok_and(|target| target == self.src(rel))
    }

    /// Every symlink under `dir`, relative to it, sorted.
    pub fn symlinks_under(dir: &Path) -> Vec<(PathBuf, PathBuf)> {
        let mut found = Vec::new();
        collect_symlinks(dir, dir, &mut found);
        found.sort();
        found
    }
}

fn collect_symlinks(root: &Path, dir: &Path, found: &mut Vec<(PathBuf, PathBuf)>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = path.symlink_metadata() else {
            continue;
        };
        if meta.file_type().is_symlink() {
            let rel = path.strip_prefix(root).expect("entry under root").to_path_buf();
            let target = std::fs::read_link(&path).expect("read link");
            found.push((rel, target));
        } else if meta.is_dir() {
            collect_symlinks(root, &path, found);
        }
    }
}

/// Fluent builder for [`StowFixture`].
pub struct FixtureBuilder {
    fixture: StowFixture,
}

impl FixtureBuilder {
    /// Add a file to the source, creating parent directories.
    pub fn with_file(self, rel: &str) -> Self {
        write_file(&self.fixture.source.join(rel), rel);
        self
    }

    /// Add an empty directory to the source.
    pub fn with_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.fixture.source.join(rel)).expect("create source subdir");
        self
    }

    /// Write a `.stowconfig` into source directory `rel` ("" for the root).
    pub fn with_config(self, rel: &str, content: &str) -> Self {
        write_file(&self.fixture.source.join(rel).join(".stowconfig"), content);
        self
    }

    /// Add a regular file to the destination.
    pub fn with_dest_file(self, rel: &str) -> Self {
        write_file(&self.fixture.dest.join(rel), "existing");
        self
    }

    pub fn build(self) -> StowFixture {
        self.fixture
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}
