//! A remote repository paired with its local clone directory

use std::path::{Path, PathBuf};

use crate::defaults::CACHE_REPOS_DIR;
use crate::error::Result;
use crate::path::join_relative;
use crate::repository::{PersistentHandle, RemoteRepo, RemoteRepository, Repository};

/// Remote repository made locally accessible through the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRepo {
    name: String,
    remote: RemoteRepo,
    local_dir: PathBuf,
}

impl CachedRepo {
    /// Cache entry `name` under `cache_dir`, cloned into
    /// `<cache_dir>/repos/<name>`.
    pub fn new(cache_dir: &Path, name: impl Into<String>, remote: impl Into<RemoteRepo>) -> Self {
        let name = name.into();
        let local_dir = local_dir_for(cache_dir, &name);
        Self {
            name,
            remote: remote.into(),
            local_dir,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote(&self) -> &RemoteRepo {
        &self.remote
    }

    /// Root of the local clone.
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Update the local clone from the remote.
    pub fn sync(&self) -> Result<()> {
        self.remote.sync(&self.local_dir)
    }
}

/// Where the clone of cache entry `name` lives.
pub fn local_dir_for(cache_dir: &Path, name: &str) -> PathBuf {
    cache_dir.join(CACHE_REPOS_DIR).join(name)
}

impl Repository for CachedRepo {
    /// The remote's sub-path, resolved inside the local clone.
    fn base_path(&self) -> PathBuf {
        join_relative(&self.local_dir, self.remote.base_path())
    }

    fn persist(&self) -> Result<PersistentHandle> {
        self.remote.persist()
    }
}
