//! # Cache Settings
//!
//! `Settings` gathers the two knobs a cache needs: where it lives on disk
//! and which git program to run. Values come either from the caller or from
//! the environment:
//!
//! - `REPO_CACHE_DIR` overrides the cache base directory (default:
//!   [`default_cache_root`](crate::defaults::default_cache_root)).
//! - `REPO_CACHE_GIT` overrides the git program (default: `git`, resolved
//!   through `PATH`).
//!
//! Settings are validated before use; an empty path is rejected with
//! [`Error::InvalidConfig`] instead of surfacing later as a confusing
//! subprocess or filesystem failure.

use std::env;
use std::path::{Path, PathBuf};

use crate::defaults::{
    default_cache_root, CACHE_CONF_FILE, CACHE_DIR_ENV, DEFAULT_GIT_PROGRAM, GIT_PROGRAM_ENV,
};
use crate::error::{Error, Result};

/// Location and tooling for a repository cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base directory holding `repos.conf` and the `repos/` working trees
    pub cache_dir: PathBuf,
    /// Path or bare name of the git executable
    pub git_program: PathBuf,
}

impl Settings {
    /// Settings for `cache_dir` using the default git program.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            git_program: PathBuf::from(DEFAULT_GIT_PROGRAM),
        }
    }

    /// Replace the git program.
    pub fn with_git_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Build settings from `REPO_CACHE_DIR` and `REPO_CACHE_GIT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var_os(key).map(PathBuf::from))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let mut settings = Self::new(default_cache_root());
        if let Some(dir) = lookup(CACHE_DIR_ENV) {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig {
                    message: format!("{} is set but empty", CACHE_DIR_ENV),
                });
            }
            settings.cache_dir = dir;
        }
        if let Some(program) = lookup(GIT_PROGRAM_ENV) {
            if program.as_os_str().is_empty() {
                return Err(Error::InvalidConfig {
                    message: format!("{} is set but empty", GIT_PROGRAM_ENV),
                });
            }
            settings.git_program = program;
        }
        Ok(settings)
    }

    /// Reject settings with empty paths.
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "cache directory is required".to_string(),
            });
        }
        if self.git_program.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "git program is required".to_string(),
            });
        }
        Ok(())
    }

    /// Path of the persisted cache index.
    pub fn config_file(&self) -> PathBuf {
        self.cache_dir.join(CACHE_CONF_FILE)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
