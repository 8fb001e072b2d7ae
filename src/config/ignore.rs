//! Per-directory `.stowconfig` parsing and ignore-pattern resolution.
//!
//! A config file binds to the directory that contains it.  Its `[ignore]`
//! patterns are resolved relative to that directory and only ever trim that
//! directory's own subtree.
//!
//! ```text
//! # comment
//! [ignore]
//! *.md
//! **/*.bak
//! [redirect]
//! "source/glob" ::: "target/glob"
//! [hardlink]
//! bin/*
//! ```
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use super::pattern::resolve_pattern;
use crate::error::IgnoreError;
use crate::logging::Log;

/// Fixed name of the per-directory config file.
pub const CONFIG_FILE_NAME: &str = ".stowconfig";

/// Separator between the two quoted halves of a `[redirect]` line.
const REDIRECT_SEPARATOR: &str = ":::";

/// A config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Glob patterns excluded from linking.
    Ignore,
    /// `"<source>" ::: "<target>"` pairs.
    Redirect,
    /// Glob patterns to hardlink instead of symlink.
    Hardlink,
}

impl Section {
    /// Section name as written between brackets.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Redirect => "redirect",
            Self::Hardlink => "hardlink",
        }
    }

    /// The section a header line opens.  Only the exact known headers
    /// switch sections; anything else, bracketed globs included, is content.
    fn from_header(line: &str) -> Option<Self> {
        match line {
            "[ignore]" => Some(Self::Ignore),
            "[redirect]" => Some(Self::Redirect),
            "[hardlink]" => Some(Self::Hardlink),
            _ => None,
        }
    }
}

/// One `[redirect]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Glob of the entries to redirect, relative to the config directory.
    pub source: String,
    /// Where matching entries should be linked instead.
    pub target: String,
}

/// Parsed contents of a `.stowconfig` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    /// `[ignore]` patterns in file order.
    pub ignore: Vec<String>,
    /// `[redirect]` pairs in file order.
    pub redirect: Vec<Redirect>,
    /// `[hardlink]` patterns in file order.
    pub hardlink: Vec<String>,
    /// Number of lines that were rejected and skipped.
    pub skipped: usize,
}

/// An entry matched by an `[ignore]` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ignorable {
    /// A file, or a symlink of any kind.
    File(PathBuf),
    /// A real directory, trimmed as a whole subtree.
    Branch(PathBuf),
}

impl Ignorable {
    /// The matched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Branch(path) => path,
        }
    }

    fn classify(path: PathBuf) -> Self {
        let is_dir = path
            .symlink_metadata()
            .is_ok_and(|meta| meta.file_type().is_dir());
        if is_dir {
            Self::Branch(path)
        } else {
            Self::File(path)
        }
    }
}

/// Lazily parsed `.stowconfig` bound to one directory.
///
/// Nothing is read until the first accessor is called; the parsed sections
/// and the resolved ignorables are then cached for the lifetime of the
/// value.
#[derive(Debug)]
pub struct IgnoreConfig {
    path: PathBuf,
    parsed: OnceCell<ParsedConfig>,
    ignorables: OnceCell<Vec<Ignorable>>,
}

impl IgnoreConfig {
    /// Bind to the config file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            parsed: OnceCell::new(),
            ignorables: OnceCell::new(),
        }
    }

    /// Bind to the config file inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CONFIG_FILE_NAME))
    }

    /// Path of the config file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the config applies to.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// Parse the file on first call and return the cached sections.
    ///
    /// # Errors
    ///
    /// Returns [`IgnoreError::Io`] if the file cannot be read.
    pub fn parsed(&self, log: &dyn Log) -> Result<&ParsedConfig, IgnoreError> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| IgnoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let parsed = parse(&text, &self.path, log);
        Ok(self.parsed.get_or_init(|| parsed))
    }

    /// Resolve every `[ignore]` pattern against the config's directory.
    ///
    /// Matches are classified as [`Ignorable::Branch`] for real directories
    /// and [`Ignorable::File`] for everything else.  Duplicates across
    /// patterns are reported once.
    ///
    /// # Errors
    ///
    /// Returns an [`IgnoreError`] if the file cannot be read or any pattern
    /// fails to resolve.  A partial result is never returned.
    pub fn ignorables(&self, log: &dyn Log) -> Result<&[Ignorable], IgnoreError> {
        if let Some(found) = self.ignorables.get() {
            return Ok(found);
        }
        let dir = self.directory();
        let mut found: Vec<Ignorable> = Vec::new();
        for pattern in &self.parsed(log)?.ignore {
            let matches = resolve_pattern(dir, pattern, &self.path)?;
            if matches.is_empty() {
                log.debug(&format!(
                    "{}: '{pattern}' matched nothing",
                    self.path.display()
                ));
            }
            for path in matches {
                if !found.iter().any(|f| f.path() == path) {
                    found.push(Ignorable::classify(path));
                }
            }
        }
        Ok(self.ignorables.get_or_init(|| found))
    }

    /// Parsed `[redirect]` entries.
    ///
    /// # Errors
    ///
    /// Returns [`IgnoreError::Io`] if the file cannot be read.
    pub fn redirects(&self, log: &dyn Log) -> Result<&[Redirect], IgnoreError> {
        Ok(&self.parsed(log)?.redirect)
    }

    /// Parsed `[hardlink]` patterns.
    ///
    /// # Errors
    ///
    /// Returns [`IgnoreError::Io`] if the file cannot be read.
    pub fn hardlinks(&self, log: &dyn Log) -> Result<&[String], IgnoreError> {
        Ok(&self.parsed(log)?.hardlink)
    }

    /// Resolve `[redirect]` entries into `(source, target)` path pairs.
    ///
    /// # Errors
    ///
    /// Always returns [`IgnoreError::Unsupported`].
    pub fn resolve_redirects(&self) -> Result<Vec<(PathBuf, PathBuf)>, IgnoreError> {
        Err(self.unsupported(Section::Redirect))
    }

    /// Resolve `[hardlink]` patterns into paths.
    ///
    /// # Errors
    ///
    /// Always returns [`IgnoreError::Unsupported`].
    pub fn resolve_hardlinks(&self) -> Result<Vec<PathBuf>, IgnoreError> {
        Err(self.unsupported(Section::Hardlink))
    }

    fn unsupported(&self, section: Section) -> IgnoreError {
        IgnoreError::Unsupported {
            section: section.name(),
            config: self.path.clone(),
        }
    }
}

/// Parse config text.  Rejected lines are logged with their line number and
/// counted in [`ParsedConfig::skipped`].
#[must_use]
pub fn parse(text: &str, origin: &Path, log: &dyn Log) -> ParsedConfig {
    let mut parsed = ParsedConfig::default();
    // Lines before any header are ignore patterns.
    let mut active = Section::Ignore;

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(section) = Section::from_header(line) {
            active = section;
            continue;
        }

        match active {
            Section::Ignore => parsed.ignore.push(line.to_string()),
            Section::Hardlink => parsed.hardlink.push(line.to_string()),
            Section::Redirect => match parse_redirect(line) {
                Some(redirect) => parsed.redirect.push(redirect),
                None => {
                    log.warn(&format!(
                        "{}:{lineno}: malformed redirect, expected \"<source>\" ::: \"<target>\"",
                        origin.display()
                    ));
                    parsed.skipped += 1;
                }
            },
        }
    }
    parsed
}

fn parse_redirect(line: &str) -> Option<Redirect> {
    let (source, target) = line.split_once(REDIRECT_SEPARATOR)?;
    let unquote = |s: &str| {
        s.trim()
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(Redirect {
        source: unquote(source)?,
        target: unquote(target)?,
    })
}
