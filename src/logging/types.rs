//! Core logging types: per-entry records, status, and the [`Log`] trait.
use std::path::PathBuf;

/// Result of one destination entry, kept for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    /// Destination path the entry was linked (or would have been linked) to.
    pub path: PathBuf,
    /// Final status of the entry.
    pub status: EntryStatus,
    /// Optional detail message (e.g., skip reason or error description).
    pub message: Option<String>,
}

/// Status of a processed destination entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// A new symlink was created.
    Linked,
    /// The destination already was a symlink to the same source.
    AlreadyLinked,
    /// The link policy refused the destination.
    Skipped,
    /// A filesystem error abandoned the entry.
    Failed,
}

/// Abstraction over logging backends.
///
/// The engine logs through `&dyn Log` so that stages never depend on how
/// output is rendered.  [`Logger`](super::logger::Logger) is the production
/// implementation.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run (status mode) message.
    fn dry_run(&self, msg: &str);
    /// Record a destination entry result for the summary.
    fn record_entry(&self, path: PathBuf, status: EntryStatus, message: Option<&str>);
}
