//! Path expansion and canonical resolution.
//!
//! Every path that enters the engine passes through [`resolve`] exactly once.
//! From then on paths are compared segment by segment, never re-canonicalised.
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// How strictly a path must exist before it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Every component must exist; symlinks are resolved throughout.
    Strict,
    /// The longest existing prefix is resolved and the rest is appended
    /// lexically.
    Loose,
}

impl Resolution {
    /// Strict unless `loose` is set.
    #[must_use]
    pub const fn from_loose(loose: bool) -> Self {
        if loose { Self::Loose } else { Self::Strict }
    }
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references.
///
/// Unknown variables expand to an empty string, matching shell behaviour.
///
/// # Examples
///
/// ```
/// use pstow_cli::paths::expand;
///
/// let expanded = expand("/etc/$PSTOW_DOC_UNSET_VAR/hosts");
/// assert_eq!(expanded, std::path::PathBuf::from("/etc//hosts"));
/// ```
#[must_use]
pub fn expand(raw: &str) -> PathBuf {
    let with_vars = expand_vars(raw);
    let home = std::env::var("HOME").ok();
    match (with_vars.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(format!("{home}{rest}"))
        }
        _ => PathBuf::from(with_vars),
    }
}

fn expand_vars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }
        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if braced {
            if chars.peek() == Some(&'}') {
                chars.next();
            } else {
                // Unterminated `${`: keep the text as written.
                out.push_str("${");
                out.push_str(&name);
                continue;
            }
        }
        if name.is_empty() {
            out.push('$');
            if braced {
                out.push_str("{}");
            }
            continue;
        }
        out.push_str(&std::env::var(&name).unwrap_or_default());
    }
    out
}

/// Expand and resolve `raw` into an absolute, symlink-resolved path.
///
/// # Errors
///
/// Under [`Resolution::Strict`] returns [`PathError::NotFound`] when the path
/// does not exist.  Either mode returns [`PathError::Resolve`] when an
/// existing component cannot be canonicalised.
pub fn resolve(raw: &str, mode: Resolution) -> Result<PathBuf, PathError> {
    if raw.trim().is_empty() {
        return Err(PathError::Invalid {
            path: PathBuf::from(raw),
            reason: "empty path".to_string(),
        });
    }
    resolve_path(&expand(raw), mode)
}

/// Resolve an already-expanded path.  See [`resolve`].
///
/// # Errors
///
/// Same as [`resolve`].
pub fn resolve_path(path: &Path, mode: Resolution) -> Result<PathBuf, PathError> {
    match mode {
        Resolution::Strict => dunce::canonicalize(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PathError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PathError::Resolve {
                    path: path.to_path_buf(),
                    source,
                }
            }
        }),
        Resolution::Loose => resolve_loose(path),
    }
}

/// Canonicalise the longest existing ancestor of `path` and append the
/// remaining components after lexical `.`/`..` folding.
fn resolve_loose(path: &Path) -> Result<PathBuf, PathError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| PathError::Resolve {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };
    let absolute = normalize(&absolute);

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        if existing.symlink_metadata().is_ok() {
            break;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }

    let mut resolved = dunce::canonicalize(existing).map_err(|source| PathError::Resolve {
        path: existing.to_path_buf(),
        source,
    })?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Fold `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve the parent of `path` loosely and re-attach its final component
/// unresolved.
///
/// Used for destinations: the entry itself may be a symlink that is about to
/// be replaced, so only the directories leading to it are resolved.
#[must_use]
pub fn resolve_parent(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => resolve_loose(parent)
            .map_or_else(|_| normalize(path), |resolved| resolved.join(name)),
        _ => normalize(path),
    }
}
