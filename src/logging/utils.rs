//! Log file location, colour stripping and timestamps.
use std::fs;
use std::path::PathBuf;

/// File every run rewrites inside the pstow cache directory.
pub(super) const LOG_FILE_NAME: &str = "stow.log";

/// Resolve `$XDG_CACHE_HOME/pstow/stow.log`, creating the directory.
///
/// An unset or empty `XDG_CACHE_HOME` falls back to `$HOME/.cache`, and a
/// missing `HOME` to `./.cache`.
pub(super) fn log_file_path() -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));
    let dir = cache.join("pstow");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(LOG_FILE_NAME))
}

/// Remove the `ESC [ ... m` colour sequences pstow writes to the console.
///
/// An unterminated sequence swallows the rest of the string.
pub(super) fn strip_colors(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some((plain, escape)) = rest.split_once("\x1b[") {
        out.push_str(plain);
        rest = escape.split_once('m').map_or("", |(_, tail)| tail);
    }
    out.push_str(rest);
    out
}

/// Current UTC time rendered with a `chrono` format string.
pub(super) fn utc_now(format: &str) -> String {
    chrono::Utc::now().format(format).to_string()
}
