//! Repository backed directly by a local directory

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::join_relative;
use crate::repository::{PersistentHandle, Repo, Repository};

/// Type tag for [`LocalRepo`] handles
pub const LOCAL_REPO_TYPE: &str = "local";

/// A repository that already lives on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRepo {
    /// Root directory of the repository
    #[serde(rename = "base")]
    pub base_dir: PathBuf,
    /// Sub-path inside the repository
    pub path: String,
}

impl LocalRepo {
    pub fn new(base_dir: impl AsRef<Path>, path: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            path: path.into(),
        }
    }
}

impl Repository for LocalRepo {
    fn base_path(&self) -> PathBuf {
        join_relative(&self.base_dir, &self.path)
    }

    fn persist(&self) -> Result<PersistentHandle> {
        Ok(PersistentHandle::new(
            LOCAL_REPO_TYPE,
            serde_json::to_string(self)?,
        ))
    }
}

/// Factory restoring a [`LocalRepo`] from its handle
pub fn local_repo_factory(handle: &PersistentHandle) -> Result<Option<Repo>> {
    if handle.kind != LOCAL_REPO_TYPE {
        return Ok(None);
    }
    let repo: LocalRepo = serde_json::from_str(&handle.opaque)?;
    Ok(Some(Repo::Local(repo)))
}
