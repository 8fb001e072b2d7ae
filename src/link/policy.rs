//! Per-destination link policy.
//!
//! A destination may be linked only if all three rules permit it:
//!
//! - **existence**: the destination is absent or already a symlink
//!   (relaxed by `force`)
//! - **ownership**: the destination is absent or owned by the invoking user
//!   (relaxed by `overwrite_others`)
//! - **self-protection**: the destination does not lie inside the source
//!   tree (never relaxed)
use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::ownership::Ownership;
use crate::paths::resolve_parent;

/// The rule that refused a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Something other than a symlink is in the way.
    Existence,
    /// The entry belongs to another user.
    Ownership,
    /// The destination is inside the source tree.
    SelfProtection,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Existence => "existence",
            Self::Ownership => "ownership",
            Self::SelfProtection => "self-protection",
        })
    }
}

/// Result of evaluating a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The destination may be (re)linked.
    Permit,
    /// The destination must be left alone.
    Deny {
        /// Rule that refused.
        rule: Rule,
        /// Human-readable explanation for the log.
        reason: String,
    },
}

impl Verdict {
    /// `true` for [`Verdict::Permit`].
    #[must_use]
    pub const fn is_permitted(&self) -> bool {
        matches!(self, Self::Permit)
    }

    fn deny(rule: Rule, reason: impl Into<String>) -> Self {
        Self::Deny {
            rule,
            reason: reason.into(),
        }
    }
}

/// Composed link predicate, built once per run.
pub struct LinkPolicy<'a> {
    source_root: PathBuf,
    force: bool,
    overwrite_others: bool,
    ownership: &'a dyn Ownership,
}

impl fmt::Debug for LinkPolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkPolicy")
            .field("source_root", &self.source_root)
            .field("force", &self.force)
            .field("overwrite_others", &self.overwrite_others)
            .finish_non_exhaustive()
    }
}

impl<'a> LinkPolicy<'a> {
    /// Build a policy protecting the canonical `source_root`.
    #[must_use]
    pub const fn new(
        source_root: PathBuf,
        force: bool,
        overwrite_others: bool,
        ownership: &'a dyn Ownership,
    ) -> Self {
        Self {
            source_root,
            force,
            overwrite_others,
            ownership,
        }
    }

    /// Decide whether `destination` may be linked.
    ///
    /// Self-protection is checked first so that its denial is reported even
    /// when another rule would also refuse.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the destination or its owner cannot be
    /// inspected for any reason other than the entry being absent.  That is
    /// a per-entry failure, not a policy refusal.
    pub fn evaluate(&self, destination: &Path) -> io::Result<Verdict> {
        if let Some(verdict) = self.check_lineage(destination) {
            return Ok(verdict);
        }
        let meta = match destination.symlink_metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Verdict::Permit),
            Err(e) => return Err(e),
        };

        if !self.force && !meta.file_type().is_symlink() {
            let kind = if meta.is_dir() { "directory" } else { "file" };
            return Ok(Verdict::deny(
                Rule::Existence,
                format!("a {kind} exists and is not a symlink"),
            ));
        }

        if !self.overwrite_others {
            match self.ownership.owned_by_invoker(destination) {
                Ok(true) => {}
                Ok(false) => return Ok(Verdict::deny(Rule::Ownership, "owned by another user")),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Verdict::Permit)
    }

    fn check_lineage(&self, destination: &Path) -> Option<Verdict> {
        let resolved = resolve_parent(destination);
        let inside = destination.starts_with(&self.source_root)
            || resolved.starts_with(&self.source_root);
        inside.then(|| {
            Verdict::deny(
                Rule::SelfProtection,
                format!("inside the source tree {}", self.source_root.display()),
            )
        })
    }
}
