//! Path manipulation utilities for repo-cache

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Join `sub` beneath `base`, treating `sub` as relative even when it starts
/// with a separator.
///
/// Repository sub-paths are recorded the way they appear in URLs
/// (`/sub/dir`), and `Path::join` would otherwise replace `base` entirely.
/// An empty `sub` yields `base` unchanged.
pub fn join_relative(base: &Path, sub: impl AsRef<Path>) -> PathBuf {
    let relative: PathBuf = sub
        .as_ref()
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    if relative.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(relative)
    }
}

/// Prepend `prefix` to `path` by plain concatenation, without inserting or
/// collapsing separators.
///
/// Used to root a traversal somewhere else on disk (a chroot-like mount
/// point) while reporting the unprefixed path.
pub fn prefixed(prefix: &Path, path: &Path) -> PathBuf {
    if prefix.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    let mut full = OsString::from(prefix.as_os_str());
    full.push(path.as_os_str());
    PathBuf::from(full)
}
