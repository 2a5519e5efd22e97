//! Default values for repo-cache configuration.
//!
//! This module provides centralized default values and well-known names
//! used across the library, ensuring the on-disk layout stays consistent.

use std::path::PathBuf;

/// Filename of the cache index inside the cache base directory.
pub const CACHE_CONF_FILE: &str = "repos.conf";

/// Sub-directory of the cache base directory holding the working trees.
pub const CACHE_REPOS_DIR: &str = "repos";

/// Git program used when none is configured; resolved through `PATH`.
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Environment variable overriding the cache base directory.
pub const CACHE_DIR_ENV: &str = "REPO_CACHE_DIR";

/// Environment variable overriding the git program.
pub const GIT_PROGRAM_ENV: &str = "REPO_CACHE_GIT";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/repo-cache` (XDG Base Directory)
/// - macOS: `~/Library/Caches/repo-cache`
/// - Windows: `{FOLDERID_LocalAppData}\repo-cache`
///
/// Falls back to `.repo-cache` in the current directory if the platform
/// cache directory cannot be determined.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("repo-cache"))
        .unwrap_or_else(|| PathBuf::from(".repo-cache"))
}
