//! # Repository Tree Walker
//!
//! [`RepoWalker`] visits every entry below a repository's base path and
//! hands each one to a callback as a [`WalkingItem`].
//!
//! Before the callback sees an entry it goes through the filter chain in
//! registration order. The first filter returning `false` rejects the entry;
//! a rejected directory is not descended into. Filters get the item mutably
//! and may rewrite it before the callback sees it, but descent always
//! follows the name found on disk.
//!
//! Two orders are supported:
//!
//! - **Depth-first** (default): a directory is descended into as soon as it
//!   has been visited, before its remaining siblings.
//! - **Breadth-first**: directories are queued and opened in the order they
//!   were found, so every entry at one depth is visited before anything
//!   deeper.
//!
//! The order of entries within one directory is whatever the filesystem
//! returns. Any I/O, filter or callback error stops the walk at once and is
//! returned from [`RepoWalker::visit`].

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use log::trace;

use crate::error::Result;
use crate::path::prefixed;
use crate::repository::Repository;

/// One entry found while walking a repository
pub struct WalkingItem<'a> {
    /// Name the repository was visited under
    pub repo_name: &'a str,
    /// Repository being walked
    pub repo: &'a dyn Repository,
    /// Directory holding the entry, rooted at the repository base path
    pub path: PathBuf,
    /// File or directory name of the entry
    pub name: OsString,
    /// Metadata of the entry itself; symlinks are not followed
    pub metadata: Metadata,
}

impl WalkingItem<'_> {
    /// [`path`](Self::path) relative to the repository base path.
    pub fn relative_dir(&self) -> PathBuf {
        match self.path.strip_prefix(self.repo.base_path()) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => self.path.clone(),
        }
    }

    /// Logical path of the entry itself.
    pub fn full_path(&self) -> PathBuf {
        self.path.join(&self.name)
    }
}

impl fmt::Debug for WalkingItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkingItem")
            .field("repo_name", &self.repo_name)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("is_dir", &self.metadata.is_dir())
            .finish_non_exhaustive()
    }
}

/// Predicate run on each entry before it is visited
pub type WalkerFilter<'f> = Box<dyn FnMut(&mut WalkingItem<'_>) -> Result<bool> + 'f>;

/// Order in which directories are descended into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkOrder {
    #[default]
    DepthFirst,
    BreadthFirst,
}

/// Walks repository trees, calling `F` for every accepted entry
pub struct RepoWalker<'f, F> {
    walker: F,
    filters: Vec<WalkerFilter<'f>>,
    path_prefix: PathBuf,
    order: WalkOrder,
}

impl<'f, F> RepoWalker<'f, F>
where
    F: FnMut(&WalkingItem<'_>) -> Result<()>,
{
    pub fn new(walker: F) -> Self {
        Self {
            walker,
            filters: Vec::new(),
            path_prefix: PathBuf::new(),
            order: WalkOrder::default(),
        }
    }

    pub fn order(mut self, order: WalkOrder) -> Self {
        self.order = order;
        self
    }

    /// Open directories under `prefix` while still reporting the
    /// unprefixed paths in items.
    ///
    /// The prefix is concatenated as is, without adding a separator.
    pub fn path_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Append a filter to the chain.
    pub fn filter<P>(mut self, filter: P) -> Self
    where
        P: FnMut(&mut WalkingItem<'_>) -> Result<bool> + 'f,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append several boxed filters to the chain, keeping their order.
    pub fn use_filters(mut self, filters: impl IntoIterator<Item = WalkerFilter<'f>>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Walk `repo` from its base path, reporting it as `name`.
    pub fn visit(&mut self, name: &str, repo: &dyn Repository) -> Result<()> {
        let base = repo.base_path();
        trace!("Walking {} from {}", name, base.display());
        match self.order {
            WalkOrder::DepthFirst => self.visit_dir(&base, name, repo, None),
            WalkOrder::BreadthFirst => {
                let mut pending = VecDeque::from([base]);
                while let Some(dir) = pending.pop_front() {
                    self.visit_dir(&dir, name, repo, Some(&mut pending))?;
                }
                Ok(())
            }
        }
    }

    /// Visit the entries of `dir`. Subdirectories are queued on `pending`
    /// when given, and descended into right away otherwise.
    fn visit_dir(
        &mut self,
        dir: &Path,
        name: &str,
        repo: &dyn Repository,
        mut pending: Option<&mut VecDeque<PathBuf>>,
    ) -> Result<()> {
        let full_path = prefixed(&self.path_prefix, dir);
        trace!("Reading {}", full_path.display());

        for entry in fs::read_dir(&full_path)? {
            let entry = entry?;
            let entry_name = entry.file_name();
            let metadata = entry.metadata()?;
            let is_dir = metadata.is_dir();

            let mut item = WalkingItem {
                repo_name: name,
                repo,
                path: dir.to_path_buf(),
                name: entry_name.clone(),
                metadata,
            };
            if !self.accepts(&mut item)? {
                trace!("Filtered out {}", dir.join(&entry_name).display());
                continue;
            }
            (self.walker)(&item)?;

            if is_dir {
                let child = dir.join(&entry_name);
                match pending.as_deref_mut() {
                    Some(queue) => queue.push_back(child),
                    None => self.visit_dir(&child, name, repo, None)?,
                }
            }
        }
        Ok(())
    }

    fn accepts(&mut self, item: &mut WalkingItem<'_>) -> Result<bool> {
        for filter in &mut self.filters {
            if !filter(&mut *item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<F> fmt::Debug for RepoWalker<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoWalker")
            .field("filters", &self.filters.len())
            .field("path_prefix", &self.path_prefix)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Ready-made walker filters
pub mod filters {
    use glob::Pattern;

    use super::WalkingItem;
    use crate::error::Result;

    const VCS_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

    /// Prune version control metadata directories.
    pub fn skip_vcs_dirs() -> impl FnMut(&mut WalkingItem<'_>) -> Result<bool> {
        |item: &mut WalkingItem<'_>| {
            let is_vcs = item.metadata.is_dir() && VCS_DIRS.iter().any(|dir| item.name == *dir);
            Ok(!is_vcs)
        }
    }

    /// Reject dot files and dot directories.
    pub fn skip_hidden() -> impl FnMut(&mut WalkingItem<'_>) -> Result<bool> {
        |item: &mut WalkingItem<'_>| Ok(!item.name.to_string_lossy().starts_with('.'))
    }

    /// Reject entries whose name matches `pattern`.
    pub fn exclude_glob(pattern: &str) -> Result<impl FnMut(&mut WalkingItem<'_>) -> Result<bool>> {
        let pattern = Pattern::new(pattern)?;
        Ok(move |item: &mut WalkingItem<'_>| Ok(!pattern.matches(&item.name.to_string_lossy())))
    }
}
