//! Glob resolution for `.stowconfig` patterns.
//!
//! This is the only place that understands pattern syntax.  Tree code asks
//! for "every entry under this directory matching this pattern" and gets
//! plain paths back.
use std::path::{Path, PathBuf};

use glob::MatchOptions;

use crate::error::IgnoreError;
use crate::paths::normalize;

/// Match options mirroring shell globbing with dotfiles enabled: `*` never
/// crosses a separator, hidden entries match, `**` recurses.
const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolve `pattern` relative to `dir`, returning every existing match.
///
/// A leading `/` anchors the pattern at `dir` itself rather than at the
/// filesystem root, and a trailing `/` is ignored.  `config` is only used
/// for error reporting.
///
/// # Errors
///
/// Returns [`IgnoreError::Pattern`] for invalid syntax and
/// [`IgnoreError::Resolve`] when a directory cannot be read while matching.
pub fn resolve_pattern(
    dir: &Path,
    pattern: &str,
    config: &Path,
) -> Result<Vec<PathBuf>, IgnoreError> {
    let relative = pattern.trim_start_matches('/').trim_end_matches('/');
    if relative.is_empty() {
        return Ok(Vec::new());
    }

    let Some(dir_str) = dir.to_str() else {
        return Err(IgnoreError::Pattern {
            pattern: pattern.to_string(),
            config: config.to_path_buf(),
            message: format!("directory is not valid UTF-8: {}", dir.display()),
        });
    };
    let full = format!("{}/{relative}", glob::Pattern::escape(dir_str));

    let paths = glob::glob_with(&full, OPTIONS).map_err(|e| IgnoreError::Pattern {
        pattern: pattern.to_string(),
        config: config.to_path_buf(),
        message: e.msg.to_string(),
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                let path = normalize(&path);
                if path.starts_with(dir) && path != dir && !matches.contains(&path) {
                    matches.push(path);
                }
            }
            Err(e) => {
                return Err(IgnoreError::Resolve {
                    pattern: pattern.to_string(),
                    path: e.path().to_path_buf(),
                    source: std::io::Error::from(e),
                });
            }
        }
    }
    Ok(matches)
}
