//! # Repository Cache
//!
//! `RepoCache` maps logical names to [`CachedRepo`]s and keeps that mapping
//! in `repos.conf` inside the cache base directory. Working trees live next
//! to it under `repos/<name>/`.
//!
//! ## Persistence
//!
//! The index is a JSON [`CacheConfig`]: one [`PersistentHandle`] per name.
//! Handles are turned back into repositories through the [`RepoRegistry`]
//! the cache was built with, so the cache never needs to know the concrete
//! repository kinds it stores.
//!
//! ## Consistency
//!
//! Every mutation is saved immediately. `add` and `remove` roll the
//! in-memory map back if the save fails, so memory and disk never disagree
//! after a failed call. There is no locking: one writer per cache directory
//! is assumed, and concurrent writers lose updates (the last save wins).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::cached::CachedRepo;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::git::{GitClient, GitCmd};
use crate::repository::{PersistentHandle, RemoteRepo, RepoRegistry, Repository};
use crate::store::{ConfigStore, FileStore};

/// On-disk format of the cache index
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "Repos", default)]
    pub repos: Option<BTreeMap<String, PersistentHandle>>,
}

/// A cache of remote repositories keyed by name
pub struct RepoCache {
    base_dir: PathBuf,
    registry: RepoRegistry,
    store: Box<dyn ConfigStore>,
    repos: HashMap<String, CachedRepo>,
}

impl RepoCache {
    /// Cache rooted at `base_dir`, persisted to `<base_dir>/repos.conf`.
    ///
    /// Nothing is read until [`load`](Self::load) is called.
    pub fn new(base_dir: impl Into<PathBuf>, registry: RepoRegistry) -> Self {
        let base_dir = base_dir.into();
        let store = FileStore::new(Settings::new(&base_dir).config_file());
        Self::with_store(base_dir, registry, store)
    }

    /// Cache rooted at `base_dir` whose index lives in `store`.
    pub fn with_store(
        base_dir: impl Into<PathBuf>,
        registry: RepoRegistry,
        store: impl ConfigStore + 'static,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            registry,
            store: Box::new(store),
            repos: HashMap::new(),
        }
    }

    /// Validate `settings`, then build and load the cache they describe
    /// with the built-in repository kinds.
    pub fn open(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let client: Arc<dyn GitClient> = Arc::new(GitCmd::new(&settings.git_program)?);
        let mut cache = Self::new(&settings.cache_dir, RepoRegistry::with_defaults(client));
        cache.load()?;
        Ok(cache)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Read the persisted index and restore every entry.
    ///
    /// A missing index is an empty cache. Entries whose type is not
    /// registered, or whose repository is not remote, are skipped. Entries
    /// that fail to restore are collected and reported together as
    /// [`Error::Load`] once every entry has been tried; the ones that did
    /// restore are kept.
    pub fn load(&mut self) -> Result<()> {
        let Some(content) = self.store.read()? else {
            return Ok(());
        };
        let config: CacheConfig = serde_json::from_slice(&content)?;

        let mut errors = Vec::new();
        for (name, handle) in config.repos.unwrap_or_default() {
            if let Err(err) = validate_name(&name) {
                errors.push((name, err));
                continue;
            }
            let repo = match self.registry.restore(&handle) {
                Ok(Some(repo)) => repo,
                Ok(None) => {
                    warn!("Skipping {}: unknown repository type {:?}", name, handle.kind);
                    continue;
                }
                Err(err) => {
                    errors.push((name, err));
                    continue;
                }
            };
            let kind = repo.type_tag();
            match repo.into_remote() {
                Some(remote) => {
                    let cached = CachedRepo::new(&self.base_dir, name.as_str(), remote);
                    self.repos.insert(name, cached);
                }
                None => warn!("Skipping {}: {} repositories cannot be cached", name, kind),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Load { errors })
        }
    }

    /// Write the index for the current entries.
    pub fn save(&self) -> Result<()> {
        let mut repos = BTreeMap::new();
        for (name, repo) in &self.repos {
            repos.insert(name.clone(), repo.persist()?);
        }
        let encoded = serde_json::to_vec_pretty(&CacheConfig { repos: Some(repos) })?;

        let mut writer = self.store.write()?;
        writer.write_all(&encoded)?;
        writer.commit()
    }

    /// Add `remote` under `name` and save.
    ///
    /// A taken name fails with [`Error::RepoAlreadyExists`], which carries
    /// the entry already there. If saving fails the entry is not added.
    pub fn add(&mut self, name: &str, remote: impl Into<RemoteRepo>) -> Result<&CachedRepo> {
        if let Some(existing) = self.repos.get(name) {
            return Err(Error::RepoAlreadyExists {
                name: name.to_string(),
                existing: Box::new(existing.clone()),
            });
        }
        validate_name(name)?;

        let cached = CachedRepo::new(&self.base_dir, name, remote);
        self.repos.insert(name.to_string(), cached);
        if let Err(err) = self.save() {
            self.repos.remove(name);
            return Err(err);
        }
        info!("Added {} to the cache", name);
        Ok(&self.repos[name])
    }

    /// Remove `name` and save. Unknown names are ignored.
    ///
    /// The working tree on disk is left alone. If saving fails the entry is
    /// put back.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(removed) = self.repos.remove(name) else {
            return Ok(());
        };
        if let Err(err) = self.save() {
            self.repos.insert(name.to_string(), removed);
            return Err(err);
        }
        info!("Removed {} from the cache", name);
        Ok(())
    }

    /// Names of all cached repositories, sorted.
    pub fn repo_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.repos.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn find(&self, name: &str) -> Option<&CachedRepo> {
        self.repos.get(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut CachedRepo> {
        self.repos.get_mut(name)
    }

    /// Sync the working tree of `name`; `Ok(false)` if there is no such
    /// entry.
    pub fn sync(&self, name: &str) -> Result<bool> {
        match self.find(name) {
            Some(repo) => {
                repo.sync()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

impl fmt::Debug for RepoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoCache")
            .field("base_dir", &self.base_dir)
            .field("registry", &self.registry)
            .field("repos", &self.repo_names())
            .finish_non_exhaustive()
    }
}

/// Names become directory names under `repos/`, so each must be exactly one
/// plain path component.
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(()),
        _ => Err(Error::InvalidConfig {
            message: format!("invalid repository name: {:?}", name),
        }),
    }
}
