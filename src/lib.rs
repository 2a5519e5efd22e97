//! # Repository Cache Library
//!
//! This library keeps local working copies of remote repositories under
//! logical names and lets callers enumerate their files. It is meant to be
//! embedded by tools that pull shared content (templates, configuration,
//! documentation) from several repositories and need a stable local path for
//! each one.
//!
//! ## Quick Example
//!
//! ```
//! use repo_cache::local::LocalRepo;
//! use repo_cache::walk::{filters, RepoWalker, WalkingItem};
//!
//! let dir = tempfile::tempdir()?;
//! std::fs::create_dir_all(dir.path().join("src"))?;
//! std::fs::create_dir_all(dir.path().join(".git"))?;
//! std::fs::write(dir.path().join("src/lib.rs"), "")?;
//!
//! let repo = LocalRepo::new(dir.path(), "");
//! let mut files = Vec::new();
//! RepoWalker::new(|item: &WalkingItem<'_>| {
//!     if item.metadata.is_file() {
//!         files.push(item.full_path());
//!     }
//!     Ok(())
//! })
//! .filter(filters::skip_vcs_dirs())
//! .visit("example", &repo)?;
//!
//! assert_eq!(files, vec![dir.path().join("src/lib.rs")]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Repositories (`repository`, `local`, `git`)**: A repository exposes a
//!   local base path and can be persisted as a tagged opaque handle. Remote
//!   repositories additionally know how to sync themselves into a directory.
//!   Git repositories are described by free-form URLs whose repository part
//!   and sub-path are detected by probing the remote.
//! - **Cache (`cache`, `cached`, `store`)**: Maps names to remote
//!   repositories, keeps each working tree under `<base>/repos/<name>`, and
//!   persists the mapping to `<base>/repos.conf` through an atomic store.
//! - **Walking (`walk`)**: Enumerates the files of any repository with a
//!   filter chain, in depth-first or breadth-first order.
//! - **Settings (`config`, `defaults`)**: Where the cache lives and which git
//!   program to run, optionally taken from the environment.
//!
//! ## Typical Flow
//!
//! 1.  Open a [`cache::RepoCache`] from [`config::Settings`].
//! 2.  `add` a detected [`git::GitRepo`] under a name, or `find` one added
//!     earlier.
//! 3.  `sync` it to clone or update the working tree.
//! 4.  Walk its `base_path()` with a [`walk::RepoWalker`].
//!
//! All operations are synchronous and report failures as [`Error`] values.

pub mod cache;
pub mod cached;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod local;
pub mod path;
pub mod repository;
pub mod store;
pub mod walk;

pub use error::{Error, Result};

#[cfg(test)]
mod path_proptest;
