//! # Repository Abstraction
//!
//! This module defines what a repository is, independent of where its
//! content comes from, and how repositories survive a save/load cycle.
//!
//! ## Design
//!
//! Two capability traits separate what every repository can do from what
//! only remote ones can:
//!
//! - **`Repository`**: exposes the effective local base path and a
//!   [`PersistentHandle`], a tagged opaque encoding of the instance.
//!
//! - **`RemoteRepository`**: a `Repository` that must be synchronized into a
//!   local directory before it can be read.
//!
//! The concrete kinds form a closed set. [`Repo`] is what a factory hands
//! back when restoring a handle; [`RemoteRepo`] is the subset a cache can
//! hold. Converting one into the other with [`Repo::into_remote`] is the
//! single place where a restored repository is checked for the remote
//! capability.
//!
//! Restoring goes through a [`RepoRegistry`], an explicit value mapping type
//! tags to factories. The registry is built by the caller and handed to the
//! cache, so tests can register their own factories without touching any
//! shared state. Process-level state that is not persisted, such as the git
//! client a [`GitRepo`] runs commands through, is reattached by the factory
//! closure at restore time.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::git::{git_repo_factory, GitClient, GitRepo, GIT_REPO_TYPE};
use crate::local::{local_repo_factory, LocalRepo, LOCAL_REPO_TYPE};

/// Tagged opaque data used to persist and restore one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentHandle {
    /// Type tag selecting the factory able to decode `opaque`
    #[serde(rename = "Type")]
    pub kind: String,
    /// Kind-specific encoding of the repository
    #[serde(rename = "Opaque")]
    pub opaque: String,
}

impl PersistentHandle {
    pub fn new(kind: impl Into<String>, opaque: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            opaque: opaque.into(),
        }
    }
}

/// A repository whose content is reachable through a local path.
///
/// The path may point inside the repository when only a sub-tree is of
/// interest.
pub trait Repository {
    /// Effective root for accessing the repository's files
    fn base_path(&self) -> PathBuf;

    /// Encode this repository so a registered factory can rebuild it.
    fn persist(&self) -> Result<PersistentHandle>;
}

/// A repository that must be synchronized before its files can be accessed
pub trait RemoteRepository: Repository {
    /// Bring `dir` up to date with the remote, cloning if needed.
    fn sync(&self, dir: &Path) -> Result<()>;
}

/// Any repository kind a factory can restore
#[derive(Debug, Clone, PartialEq)]
pub enum Repo {
    Local(LocalRepo),
    Git(GitRepo),
}

impl Repo {
    /// Type tag this repository persists under.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Repo::Local(_) => LOCAL_REPO_TYPE,
            Repo::Git(_) => GIT_REPO_TYPE,
        }
    }

    /// Narrow to a remote repository, or `None` for purely local kinds.
    pub fn into_remote(self) -> Option<RemoteRepo> {
        match self {
            Repo::Local(_) => None,
            Repo::Git(repo) => Some(RemoteRepo::Git(repo)),
        }
    }
}

impl Repository for Repo {
    fn base_path(&self) -> PathBuf {
        match self {
            Repo::Local(repo) => repo.base_path(),
            Repo::Git(repo) => repo.base_path(),
        }
    }

    fn persist(&self) -> Result<PersistentHandle> {
        match self {
            Repo::Local(repo) => repo.persist(),
            Repo::Git(repo) => repo.persist(),
        }
    }
}

impl From<LocalRepo> for Repo {
    fn from(repo: LocalRepo) -> Self {
        Repo::Local(repo)
    }
}

impl From<GitRepo> for Repo {
    fn from(repo: GitRepo) -> Self {
        Repo::Git(repo)
    }
}

/// Remote repository kinds a cache can hold
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRepo {
    Git(GitRepo),
}

impl Repository for RemoteRepo {
    fn base_path(&self) -> PathBuf {
        match self {
            RemoteRepo::Git(repo) => repo.base_path(),
        }
    }

    fn persist(&self) -> Result<PersistentHandle> {
        match self {
            RemoteRepo::Git(repo) => repo.persist(),
        }
    }
}

impl RemoteRepository for RemoteRepo {
    fn sync(&self, dir: &Path) -> Result<()> {
        match self {
            RemoteRepo::Git(repo) => repo.sync(dir),
        }
    }
}

impl From<GitRepo> for RemoteRepo {
    fn from(repo: GitRepo) -> Self {
        RemoteRepo::Git(repo)
    }
}

/// Rebuilds a repository from a handle.
///
/// Returns `Ok(None)` when the handle's type tag is not the factory's own,
/// and an error (never a half-built repository) when the opaque data cannot
/// be decoded.
pub type RepoFactory = Box<dyn Fn(&PersistentHandle) -> Result<Option<Repo>> + Send + Sync>;

/// Registry of repository factories keyed by type tag
#[derive(Default)]
pub struct RepoRegistry {
    factories: HashMap<String, RepoFactory>,
}

impl RepoRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `local` and `git` kinds.
    ///
    /// Restored git repositories run their commands through `client`.
    pub fn with_defaults(client: Arc<dyn GitClient>) -> Self {
        let mut registry = Self::new();
        registry.register(LOCAL_REPO_TYPE, local_repo_factory);
        registry.register(GIT_REPO_TYPE, move |handle: &PersistentHandle| {
            git_repo_factory(handle, Arc::clone(&client))
        });
        registry
    }

    /// Register `factory` under `tag`, replacing any previous one.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&PersistentHandle) -> Result<Option<Repo>> + Send + Sync + 'static,
    {
        self.factories.insert(tag.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Restore the repository behind `handle`.
    ///
    /// An unregistered type tag yields `Ok(None)`, so caches written by a
    /// newer version with unknown kinds still load.
    pub fn restore(&self, handle: &PersistentHandle) -> Result<Option<Repo>> {
        match self.factories.get(&handle.kind) {
            Some(factory) => factory(handle),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for RepoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.factories.keys().collect();
        tags.sort();
        f.debug_struct("RepoRegistry").field("types", &tags).finish()
    }
}
