//! # Error Handling
//!
//! This module defines the centralized error type for `repo-cache`. It uses
//! the `thiserror` library to derive a single `Error` enum that covers every
//! anticipated failure mode, from URL detection through persistence and tree
//! walking.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failures returned by the library. Variants
//!   carry structured context (the git command, its captured stderr, the
//!   offending URL) rather than flattened messages.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Nothing in the library retries or aborts the process on failure; every
//! error is handed back to the caller, who decides whether to retry, report
//! or give up.

use thiserror::Error;

use crate::cached::CachedRepo;

/// Main error type for repo-cache operations
#[derive(Error, Debug)]
pub enum Error {
    /// No git repository could be found behind the given URL.
    ///
    /// Detection probed every candidate prefix and path segment and the
    /// remote rejected all of them.
    #[error("Invalid git url: {url}")]
    InvalidGitUrl { url: String },

    /// A git subprocess exited unsuccessfully or could not be started.
    ///
    /// `message` describes the execution failure (exit status or spawn
    /// error). `stdout` and `stderr` are whatever git printed on each stream,
    /// kept separate so they can be shown on their own.
    #[error("Git command failed: {command} - {message}{}", if stderr.is_empty() { String::new() } else { format!(":\n{}", stderr.trim_end()) })]
    GitCommand {
        command: String,
        message: String,
        stdout: String,
        stderr: String,
    },

    /// A repository with this name is already in the cache.
    ///
    /// The existing entry is returned alongside the error so the caller can
    /// decide to reuse it.
    #[error("Repository already exists: {name}")]
    RepoAlreadyExists {
        name: String,
        existing: Box<CachedRepo>,
    },

    /// A required value was missing or empty at construction time.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// One or more persisted entries could not be restored while loading.
    #[error("Failed to load {} cached repositories:{}", errors.len(), errors.iter().map(|(name, e)| format!("\n  {}: {}", name, e)).collect::<String>())]
    Load { errors: Vec<(String, Error)> },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON encoding or decoding error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
